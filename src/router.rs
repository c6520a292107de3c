//! Route-table builder.
//!
//! A [`Router`] is mutable only while the application is being assembled.
//! [`Router::into_app`] freezes it into an [`App`], after which routes and
//! middleware can no longer change.

use std::sync::Arc;

use crate::app::App;
use crate::endpoint::Endpoint;
use crate::method::Method;
use crate::middleware::Middleware;
use crate::tree::Node;

/// The application router.
///
/// A tree of path segments. Every node may carry endpoints (one per method)
/// and middleware that applies to the node and everything below it. Each
/// builder call returns `self`, so registrations chain naturally:
///
/// ```rust
/// use kumi::{Context, Response, Router, middleware::{Next, Trace}};
///
/// # async fn index(_: Context<()>) -> kumi::Result<Response> { Ok(Response::text("")) }
/// # async fn list_users(_: Context<()>) -> kumi::Result<Response> { Ok(Response::text("")) }
/// # async fn get_user(_: Context<()>) -> kumi::Result<Response> { Ok(Response::text("")) }
/// # async fn auth(ctx: Context<()>, next: Next<()>) -> kumi::Result<Response> { next.run(ctx).await }
/// let app = Router::new()
///     .with(Trace)
///     .get("/", index)
///     .scope("/api", |api| api
///         .with(auth)
///         .get("/users", list_users)
///         .get("/users/{id}", get_user))
///     .into_app(());
/// ```
///
/// `Trace` wraps every route; `auth` wraps only the routes under `/api`.
pub struct Router<S> {
    root: Node<S>,
}

impl<S: Send + Sync + 'static> Router<S> {
    pub fn new() -> Self {
        Self { root: Node::root() }
    }

    /// Registers an endpoint for a method + pattern pair.
    ///
    /// Patterns are `/`-separated segments. A segment is a literal, a
    /// `{name}` parameter matching any single segment, or a trailing
    /// `{*name}` catch-all matching the rest of the path. Parameters are read
    /// back with [`Context::param`](crate::Context::param).
    ///
    /// # Panics
    ///
    /// Panics if the pattern is malformed or the same method is already
    /// registered for the same pattern.
    pub fn on(mut self, method: Method, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.root.insert(pattern, method, endpoint.into_boxed_endpoint());
        self
    }

    pub fn get(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Get, pattern, endpoint)
    }

    pub fn post(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Post, pattern, endpoint)
    }

    pub fn put(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Put, pattern, endpoint)
    }

    pub fn delete(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Delete, pattern, endpoint)
    }

    pub fn patch(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Patch, pattern, endpoint)
    }

    pub fn head(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Head, pattern, endpoint)
    }

    pub fn options(self, pattern: &str, endpoint: impl Endpoint<S>) -> Self {
        self.on(Method::Options, pattern, endpoint)
    }

    /// Appends a middleware link to this router's root node.
    ///
    /// The link wraps every route of this router, including routes
    /// registered before the call. Inside a [`scope`](Router::scope) closure
    /// the root is the scope's node, so the link only wraps that scope.
    /// Links run in the order they were added, outer scopes first.
    pub fn with(mut self, middleware: impl Middleware<S>) -> Self {
        self.root.add_middleware(Arc::new(middleware));
        self
    }

    /// Builds routes and middleware local to `prefix`.
    ///
    /// The closure receives an empty router whose root stands for `prefix`.
    /// Calling `scope` twice with the same prefix adds to the same node.
    pub fn scope(self, prefix: &str, build: impl FnOnce(Router<S>) -> Router<S>) -> Self {
        self.nest(prefix, build(Router::new()))
    }

    /// Grafts a separately built router at `prefix`.
    ///
    /// The nested router's root middleware becomes middleware of the `prefix`
    /// node; its routes are re-rooted under `prefix`.
    ///
    /// # Panics
    ///
    /// Panics if the prefix is malformed or both routers register the same
    /// method on the same path.
    pub fn nest(mut self, prefix: &str, router: Router<S>) -> Self {
        let at = format!("/{}", crate::tree::segments(prefix).collect::<Vec<_>>().join("/"));
        self.root.descend(prefix).merge(router.root, &at);
        self
    }

    /// Freezes the route table and binds it to shared application state.
    ///
    /// # Panics
    ///
    /// Panics if a route binds the same parameter name twice (for example a
    /// `{id}` scope containing an `{id}` route) or nests routes below a
    /// catch-all.
    pub fn into_app(self, state: S) -> App<S> {
        App::new(self.root.freeze(), state)
    }
}

impl<S: Send + Sync + 'static> Default for Router<S> {
    fn default() -> Self { Self::new() }
}
