//! # kumi
//!
//! Nested routing scopes and around-style middleware on top of hyper.
//!
//! ## The model
//!
//! - A [`Router`] is a tree of path segments. Endpoints hang off nodes, one
//!   per method. [`Router::scope`] and [`Router::nest`] build sub-trees.
//! - Middleware attaches to a node and wraps every route at or below it.
//!   A request runs the middleware of every node on its path, root first,
//!   in registration order, then the endpoint.
//! - Each link gets the [`Context`] and [`Next`](middleware::Next), the rest
//!   of the chain. Code before `next.run(ctx)` runs on the way in, code after
//!   it on the way out, and returning early short-circuits everything inside.
//! - [`Router::into_app`] freezes the tree into an [`App`]. From then on
//!   routing is lock-free shared reads.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use kumi::{Context, Response, Router, Server, StatusCode};
//! use kumi::middleware::{Next, Trace};
//!
//! struct State { api_key: String }
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .with(Trace)
//!         .get("/", index)
//!         .scope("/api", |api| api
//!             .with(require_key)
//!             .get("/users/{id}", get_user))
//!         .into_app(State { api_key: "s3cret".into() });
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn index(_ctx: Context<State>) -> kumi::Result<Response> {
//!     Ok(Response::text("hello"))
//! }
//!
//! async fn require_key(ctx: Context<State>, next: Next<State>) -> kumi::Result<Response> {
//!     if ctx.request().header("x-api-key") != Some(ctx.state().api_key.as_str()) {
//!         return Ok(Response::status(StatusCode::UNAUTHORIZED));
//!     }
//!     next.run(ctx).await
//! }
//!
//! async fn get_user(ctx: Context<State>) -> kumi::Result<Response> {
//!     let id = ctx.param("id").unwrap_or("unknown");
//!     Ok(Response::json(format!(r#"{{"id":"{id}"}}"#)))
//! }
//! ```

mod app;
mod compute;
mod context;
mod endpoint;
mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod tree;

pub mod health;
pub mod middleware;

pub use app::App;
pub use compute::{Cookies, FromContext};
pub use context::{Context, Params};
pub use endpoint::{BoxFuture, Endpoint};
pub use error::{BoxError, Error, Result};
pub use http::StatusCode;
pub use method::{AllowedMethods, Method};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use tree::{Matched, Resolution};
