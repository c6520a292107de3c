//! Around-style middleware.
//!
//! A middleware link receives the request [`Context`] together with [`Next`],
//! the rest of the chain. Everything before `next.run(ctx)` is "before" logic,
//! everything after it is "after" logic, and data flows between the two in
//! ordinary local variables:
//!
//! ```rust
//! use std::time::Instant;
//! use kumi::{Context, Response, middleware::Next};
//!
//! async fn timing(ctx: Context<()>, next: Next<()>) -> kumi::Result<Response> {
//!     let started = Instant::now();
//!     let mut res = next.run(ctx).await?;
//!     res.set_header("x-elapsed-us", &started.elapsed().as_micros().to_string());
//!     Ok(res)
//! }
//! ```
//!
//! A link may also return without calling `next`, which short-circuits every
//! inner link and the endpoint:
//!
//! ```rust
//! use kumi::{Context, Response, StatusCode, middleware::Next};
//!
//! async fn require_token(ctx: Context<()>, next: Next<()>) -> kumi::Result<Response> {
//!     if ctx.request().header("authorization").is_none() {
//!         return Ok(Response::status(StatusCode::UNAUTHORIZED));
//!     }
//!     next.run(ctx).await
//! }
//! ```

mod trace;

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::endpoint::{BoxFuture, BoxedEndpoint};
use crate::error::Result;

pub use trace::Trace;

/// A link in the middleware chain.
///
/// Links are shared by every concurrent request that reaches their scope, so
/// they take `&self` and must not keep per-request state in fields. Any async
/// fn or closure of shape `Fn(Context<S>, Next<S>) -> impl Future<Output =
/// kumi::Result<Response>>` is a `Middleware`; implement the trait by hand
/// when the link carries configuration.
pub trait Middleware<S>: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: Context<S>, next: Next<S>) -> BoxFuture<'a>;
}

impl<S, F, Fut> Middleware<S> for F
where
    S: Send + Sync + 'static,
    F: Fn(Context<S>, Next<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result> + Send + 'static,
{
    fn handle<'a>(&'a self, ctx: Context<S>, next: Next<S>) -> BoxFuture<'a> {
        Box::pin(self(ctx, next))
    }
}

/// Type-erased middleware as stored in the route tree.
pub(crate) type BoxedMiddleware<S> = Arc<dyn Middleware<S>>;

/// The remainder of a request's chain: the links not yet run, then the endpoint.
///
/// `Next` is consumed by [`Next::run`], so the rest of the chain runs at most
/// once per link. Advancing twice does not compile:
///
/// ```rust,compile_fail
/// use kumi::{Context, Response, middleware::Next};
///
/// async fn twice(ctx: Context<()>, next: Next<()>) -> kumi::Result<Response> {
///     let _ = next.run(ctx).await;
///     next.run(todo!()).await
/// }
/// ```
///
/// Dropping `Next` without running it is a short-circuit.
pub struct Next<S> {
    stack: Arc<[BoxedMiddleware<S>]>,
    endpoint: BoxedEndpoint<S>,
    cursor: usize,
}

impl<S: Send + Sync + 'static> Next<S> {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware<S>]>, endpoint: BoxedEndpoint<S>) -> Self {
        Self { stack, endpoint, cursor: 0 }
    }

    /// Runs the rest of the chain to completion and returns its response.
    pub async fn run(mut self, ctx: Context<S>) -> Result {
        match self.stack.get(self.cursor).cloned() {
            Some(link) => {
                self.cursor += 1;
                link.handle(ctx, self).await
            }
            None => self.endpoint.call(ctx).await,
        }
    }

    /// Number of links left before the endpoint.
    pub fn remaining(&self) -> usize {
        self.stack.len() - self.cursor
    }
}
