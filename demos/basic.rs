//! Minimal restmux example: a users resource, a streamed report and a
//! negotiated greeting.
//!
//! Run with:
//!   RUST_LOG=restmux=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/42/orders/7
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl http://localhost:3000/reports/daily
//!   curl -H 'accept: text/html' http://localhost:3000/greeting

use std::sync::Arc;

use http::StatusCode;
use restmux::media::{AcceptMediaTypes, ContentMediaType};
use restmux::{
    ChunkedBody, DynamicResource, JsonMapper, Method, Request, Resources, Response, Server,
    ServerConfig,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Serialize)]
struct User {
    #[serde(default)]
    id: String,
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), restmux::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("RESTMUX_CONFIG") {
        Ok(path) => ServerConfig::load(path)?,
        Err(_) => ServerConfig::from_toml_str("bind_address = \"0.0.0.0:3000\"")?,
    };

    let mapper = Arc::new(JsonMapper);
    let create_mapper = Arc::clone(&mapper);

    let users = DynamicResource::builder("users")
        .configured(&config)
        .on_with_signature(Method::Get, "/users/{id}", "String id", move |req: Request| {
            let mapper = Arc::clone(&mapper);
            async move {
                let user = User {
                    id: req.param("id").unwrap_or_default().to_owned(),
                    name: "alice".to_owned(),
                };
                Response::builder().mapped(&*mapper, &user)
            }
        })
        .on_with_signature(
            Method::Get,
            "/users/{id}/orders/{orderId}",
            "String id, String orderId",
            get_order,
        )
        .on(Method::Post, "/users", move |req: Request| {
            let mapper = Arc::clone(&create_mapper);
            async move {
                match req.mapped_body::<User, _>(&*mapper) {
                    Ok(user) => Response::builder()
                        .status(StatusCode::CREATED)
                        .header("location", &format!("/users/{}", user.id))
                        .mapped(&*mapper, &user),
                    Err(_) => Response::status(StatusCode::BAD_REQUEST),
                }
            }
        })
        .build()?;

    let reports = DynamicResource::builder("reports")
        .configured(&config)
        .on(Method::Get, "/reports/{name}", report)
        .on(Method::Get, "/greeting", greeting)
        .build()?;

    Server::from_config(&config)?
        .serve(Resources::new().with(users).with(reports))
        .await
}

// GET /users/{id}/orders/{orderId}
async fn get_order(req: Request) -> Response {
    let (Some(id), Some(order)) = (req.param("id"), req.param("orderId")) else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    Response::json(format!(r#"{{"id":"{id}","orderId":"{order}"}}"#))
}

// GET /reports/{name}: one chunk per line, sent with transfer-encoding: chunked.
async fn report(req: Request) -> Response {
    match build_report(req.param("name").unwrap_or("report")) {
        Ok(body) => Response::builder().chunked(ContentMediaType::Text, body),
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn build_report(name: &str) -> Result<ChunkedBody, restmux::Error> {
    let mut body = ChunkedBody::new();
    for row in 1..=3 {
        body.append_chunk(format!("{name} row {row}\n"))?;
    }
    body.end()?;
    Ok(body)
}

// GET /greeting: html or plain text, whichever the client prefers.
async fn greeting(req: Request) -> Response {
    let Ok(accept) = AcceptMediaTypes::parse(req.header("accept").unwrap_or("")) else {
        return Response::status(StatusCode::BAD_REQUEST);
    };

    let offered = [ContentMediaType::Html.descriptor(), ContentMediaType::Text.descriptor()];
    match accept.negotiate(&offered) {
        Some(chosen) if chosen.mime_sub_type() == "html" => {
            Response::builder().content(chosen.clone(), "<p>hello</p>")
        }
        Some(_) => Response::text("hello"),
        None => Response::status(StatusCode::NOT_ACCEPTABLE),
    }
}
