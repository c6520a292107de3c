//! Per-request context handed to middleware and endpoints.

use std::sync::Arc;

use crate::request::Request;

/// Path parameters bound by the matched route, in pattern order.
///
/// Keys are unique: a route binding the same name twice is rejected when the
/// router is frozen.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub(crate) fn push(&mut self, name: &str, value: String) {
        self.0.push((name.to_owned(), value));
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Everything a middleware link or endpoint knows about one request.
///
/// Holds shared application state, the inbound [`Request`] and the matched
/// [`Params`]. The continuation is *not* part of the context: middleware
/// receives it separately as [`Next`](crate::middleware::Next), and endpoints
/// never see one, so the terminal endpoint cannot re-enter the chain.
///
/// `S` is whatever the application passed to
/// [`Router::into_app`](crate::Router::into_app). kumi only ever hands out
/// shared references to it; mutation needs the application's own
/// synchronisation (`Mutex`, atomics, a connection pool…).
pub struct Context<S> {
    state: Arc<S>,
    request: Request,
    params: Params,
}

impl<S> Context<S> {
    pub(crate) fn new(state: Arc<S>, request: Request, params: Params) -> Self {
        Self { state, request, params }
    }

    pub fn state(&self) -> &S { &self.state }

    /// An owned handle to the shared state, for links that still need it
    /// after handing the context to [`Next::run`](crate::middleware::Next::run).
    pub fn shared_state(&self) -> Arc<S> { Arc::clone(&self.state) }

    pub fn request(&self) -> &Request { &self.request }

    /// Mutable access for middleware that rewrites what inner links see.
    pub fn request_mut(&mut self) -> &mut Request { &mut self.request }

    pub fn params(&self) -> &Params { &self.params }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Consumes the context, returning the request.
    pub fn into_request(self) -> Request { self.request }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[test]
    fn params_lookup_by_name() {
        let mut params = Params::default();
        params.push("org", "kumi".to_owned());
        params.push("id", "7".to_owned());
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("nope"), None);
        assert_eq!(params.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["org", "id"]);
    }

    #[test]
    fn request_mut_is_visible_through_request() {
        let mut ctx = Context::new(Arc::new(5u8), Request::new(Method::Get, "/"), Params::default());
        ctx.request_mut().set_header("x-user", "ada");
        assert_eq!(ctx.request().header("x-user"), Some("ada"));
        assert_eq!(*ctx.state(), 5);
    }
}
