//! The dispatcher: one request in, one response out.

use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::method::{AllowedMethods, Method};
use crate::middleware::Next;
use crate::request::Request;
use crate::response::Response;
use crate::tree::{Frozen, Resolution};

/// A frozen route table bound to shared application state.
///
/// Built by [`Router::into_app`](crate::Router::into_app). Cloning is cheap
/// (one atomic increment) and every clone serves from the same tree, so an
/// `App` can be handed to any number of concurrent tasks.
pub struct App<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    tree: Frozen<S>,
    state: Arc<S>,
}

impl<S> Clone for App<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: Send + Sync + 'static> App<S> {
    pub(crate) fn new(tree: Frozen<S>, state: S) -> Self {
        Self { inner: Arc::new(Inner { tree, state: Arc::new(state) }) }
    }

    pub fn state(&self) -> &S { &self.inner.state }

    /// Resolves `method` and `path` against the route table.
    ///
    /// Synchronous: nothing here suspends, allocates beyond the bound
    /// parameters, or runs application code.
    pub fn resolve(&self, method: Method, path: &str) -> Resolution<S> {
        self.inner.tree.resolve(method, path)
    }

    /// Methods offered by the first route matching `path`, or `None` when no
    /// route matches it at all.
    pub fn allowed(&self, path: &str) -> Option<AllowedMethods> {
        self.inner.tree.allowed(path)
    }

    /// Routes `req` and runs its middleware chain and endpoint.
    ///
    /// - No route for the path: `404 Not Found`, no middleware runs.
    /// - Route without the request's method: `405 Method Not Allowed` with an
    ///   `allow` header listing the registered methods, no middleware runs.
    /// - Otherwise the matched chain runs and its outcome is returned as is,
    ///   including any error raised by a link or the endpoint.
    pub async fn dispatch(&self, req: Request) -> Result {
        let matched = match self.resolve(req.method(), req.path()) {
            Resolution::Matched(matched) => matched,
            Resolution::NotFound => {
                debug!(method = %req.method(), path = req.path(), "no route");
                return Ok(Response::status(StatusCode::NOT_FOUND));
            }
            Resolution::MethodNotAllowed(allowed) => {
                debug!(method = %req.method(), path = req.path(), allow = %allowed.header_value(), "method not allowed");
                return Ok(method_not_allowed(&allowed));
            }
        };

        debug!(route = matched.pattern(), links = matched.middleware_len(), "route matched");
        let ctx = Context::new(Arc::clone(&self.inner.state), req, matched.params);
        Next::new(matched.stack, matched.endpoint).run(ctx).await
    }
}

/// `405 Method Not Allowed` with an `allow` header listing `allowed`.
pub(crate) fn method_not_allowed(allowed: &AllowedMethods) -> Response {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("allow", &allowed.header_value())
        .no_body()
}
