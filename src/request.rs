//! Incoming HTTP request type.

use bytes::Bytes;
use http_body_util::BodyExt;

use crate::error::Error;
use crate::method::Method;

/// An incoming HTTP request.
///
/// A plain value: the server builds one from the wire, tests build one with
/// [`Request::new`]. Route parameters live on [`Context`](crate::Context),
/// not here, because they only exist once a route has been resolved.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Request {
    /// Builds a request for `method` on `target`. A `?query` suffix is split off.
    ///
    /// ```rust
    /// use kumi::{Method, Request};
    ///
    /// let req = Request::new(Method::Post, "/users?notify=1")
    ///     .with_header("content-type", "application/json")
    ///     .with_body(r#"{"name":"alice"}"#);
    /// assert_eq!(req.path(), "/users");
    /// assert_eq!(req.query(), Some("notify=1"));
    /// ```
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces every value of `name` with `value`.
    ///
    /// Middleware uses this to rewrite the request seen by inner links.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Reads a hyper request off the wire, buffering the whole body.
    ///
    /// Header values that are not valid UTF-8 are skipped.
    pub(crate) async fn from_hyper(
        method: Method,
        req: hyper::Request<hyper::body::Incoming>,
    ) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let headers = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();
        let body = body.collect().await?.to_bytes();
        Ok(Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers,
            body,
        })
    }
}
