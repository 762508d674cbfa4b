//! # restmux
//!
//! Verb-aware request routing for HTTP services that group their routes into
//! named resources.
//!
//! - **Routing**: each [`DynamicResource`] compiles its path templates into
//!   [`Action`]s, ordered deepest path first, and matches requests against
//!   them in that order. `{name}` binds one segment, `{*name}` the rest.
//! - **Dispatch**: a matched request carries its [`MappedParameters`] to the
//!   handler at the same position, run on a bounded [`HandlerPool`].
//! - **Bodies**: plain or [`ChunkedBody`], which writes HTTP/1.1 chunk
//!   framing as chunks are appended.
//! - **Media types**: [`media::MediaTypeDescriptor`] parsing and `Accept`
//!   negotiation; a pluggable [`Mapper`] turns values into bodies and back.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use restmux::{DynamicResource, Method, Request, Resources, Response, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restmux::Error> {
//!     let users = DynamicResource::builder("users")
//!         .handler_pool_size(4)
//!         .on(Method::Get, "/users/{id}", get_user)
//!         .on(Method::Get, "/users/{id}/orders/{orderId}", get_order)
//!         .build()?;
//!
//!     Server::bind("0.0.0.0:3000")?
//!         .serve(Resources::new().with(users))
//!         .await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn get_order(req: Request) -> Response {
//!     let (Some(id), Some(order)) = (req.param("id"), req.param("orderId")) else {
//!         return Response::status(http::StatusCode::BAD_REQUEST);
//!     };
//!     Response::text(format!("order {order} of user {id}"))
//! }
//! ```

mod action;
mod body;
mod chunked;
mod config;
mod error;
mod handler;
mod mapper;
mod method;
mod pool;
mod request;
mod resource;
mod response;
mod server;

pub mod media;

pub use action::{Action, MappedParameters, MatchResult};
pub use body::{Body, PlainBody};
pub use chunked::{ChunkFrames, ChunkedBody};
pub use config::{ResourceConfig, ServerConfig};
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use mapper::{JsonMapper, Mapper};
pub use method::Method;
pub use pool::{HandlerPool, PooledHandler};
pub use request::Request;
pub use resource::{DynamicResource, RequestHandler, ResourceBuilder, Resources};
pub use response::{HttpBody, IntoResponse, Response, ResponseBuilder};
pub use server::{Server, serve_listener};
