//! HTTP server and graceful shutdown.
//!
//! The server owns the socket side: hyper parses requests, the hosted
//! [`Resources`] match and dispatch them, and responses go back through
//! hyper, which writes `content-length` or chunk framing as the body asks.
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::resource::Resources;
use crate::response::{HttpBody, Response};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|source| Error::InvalidAddress {
            addr: addr.to_owned(),
            source,
        })?;
        Ok(Self { addr })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, Error> {
        Self::bind(&config.bind_address)
    }

    /// Serves `resources` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, resources: Resources) -> Result<(), Error> {
        self.serve_with_shutdown(resources, shutdown_signal()).await
    }

    /// Serves `resources` until `signal` resolves, then drains.
    pub async fn serve_with_shutdown(
        self,
        resources: Resources,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, resources, signal).await
    }
}

/// Runs the accept loop on an already bound listener.
pub async fn serve_listener(
    listener: TcpListener,
    resources: Resources,
    signal: impl Future<Output = ()>,
) -> Result<(), Error> {
    let resources = Arc::new(resources);
    info!(addr = %listener.local_addr()?, resources = resources.len(), "restmux listening");

    let mut tasks = tokio::task::JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Shutdown is checked first so a signal stops accepting at once.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let resources = Arc::clone(&resources);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let resources = Arc::clone(&resources);
                        async move { dispatch(&resources, req).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        warn!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("restmux stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Turns one hyper request into one response. Every failure becomes a
/// status code here, so hyper never sees an error.
async fn dispatch(
    resources: &Resources,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<HttpBody>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(method) = Method::try_from(&parts.method) else {
        debug!(method = %parts.method, "unsupported method");
        return Ok(Response::status(StatusCode::METHOD_NOT_ALLOWED).into_http());
    };

    let body: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_http());
        }
    };

    let request = Request::new(method, parts.uri)
        .with_headers(parts.headers)
        .with_body(body);

    Ok(resources.handle(request).await.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or SIGINT (Ctrl-C). If a handler cannot be installed
/// that signal is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
