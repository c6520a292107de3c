//! Route tree: one node per path segment.
//!
//! The tree exists in two phases. During setup [`Node`]s are created and
//! mutated by [`Router`](crate::Router). [`Node::freeze`] then turns it into
//! [`Frozen`] nodes, which are never mutated again and are read concurrently
//! by every request without locking.
//!
//! Freezing precomputes, for every node, the full middleware stack that
//! applies to it: the stacks of all ancestors (root first) followed by the
//! node's own links in registration order. Resolving a request therefore
//! only walks segments; it never concatenates lists.
//!
//! Matching is depth-first in declaration order. Literal segments must match
//! exactly, `{name}` matches any one segment, `{*name}` matches all remaining
//! segments. The first branch that consumes the whole path and ends on a node
//! with an endpoint for the request's method wins; a branch that dead-ends is
//! abandoned and its bindings are dropped. If no branch serves the method,
//! the first node that matched by path answers `405` with its methods.

use std::fmt;
use std::sync::Arc;

use crate::context::Params;
use crate::endpoint::BoxedEndpoint;
use crate::method::{AllowedMethods, Method};
use crate::middleware::BoxedMiddleware;

// ── Segments ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    Root,
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Self {
        let Some(inner) = raw.strip_prefix('{') else {
            if raw.contains(['{', '}']) {
                panic!("invalid route `{pattern}`: stray brace in segment `{raw}`");
            }
            return Self::Literal(raw.to_owned());
        };
        let Some(inner) = inner.strip_suffix('}') else {
            panic!("invalid route `{pattern}`: unterminated parameter `{raw}`");
        };
        let (catch_all, name) = match inner.strip_prefix('*') {
            Some(name) => (true, name),
            None => (false, inner),
        };
        if name.is_empty() || name.contains(['{', '}', '*']) {
            panic!("invalid route `{pattern}`: bad parameter name in `{raw}`");
        }
        if catch_all { Self::CatchAll(name.to_owned()) } else { Self::Param(name.to_owned()) }
    }

    fn param_name(&self) -> Option<&str> {
        match self {
            Self::Param(name) | Self::CatchAll(name) => Some(name.as_str()),
            Self::Root | Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => Ok(()),
            Self::Literal(lit) => f.write_str(lit),
            Self::Param(name) => write!(f, "{{{name}}}"),
            Self::CatchAll(name) => write!(f, "{{*{name}}}"),
        }
    }
}

/// Splits a request path or route pattern into non-empty segments.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn join(prefix: &str, segment: &Segment) -> String {
    match prefix {
        "/" => format!("/{segment}"),
        _ => format!("{prefix}/{segment}"),
    }
}

// ── Setup phase ───────────────────────────────────────────────────────────────

/// A mutable node, used only while the router is being built.
pub(crate) struct Node<S> {
    segment: Segment,
    children: Vec<Node<S>>,
    endpoints: Vec<(Method, BoxedEndpoint<S>)>,
    middleware: Vec<BoxedMiddleware<S>>,
}

impl<S> Node<S> {
    pub(crate) fn root() -> Self {
        Self::new(Segment::Root)
    }

    fn new(segment: Segment) -> Self {
        Self { segment, children: Vec::new(), endpoints: Vec::new(), middleware: Vec::new() }
    }

    /// Walks `pattern` from this node, creating missing nodes on the way.
    pub(crate) fn descend(&mut self, pattern: &str) -> &mut Self {
        let mut node = self;
        for raw in segments(pattern) {
            let segment = Segment::parse(raw, pattern);
            let idx = match node.children.iter().position(|c| c.segment == segment) {
                Some(idx) => idx,
                None => {
                    node.children.push(Self::new(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        node
    }

    pub(crate) fn insert(&mut self, pattern: &str, method: Method, endpoint: BoxedEndpoint<S>) {
        let node = self.descend(pattern);
        if node.endpoints.iter().any(|(m, _)| *m == method) {
            panic!("route `{method} {pattern}` registered twice");
        }
        node.endpoints.push((method, endpoint));
    }

    pub(crate) fn add_middleware(&mut self, link: BoxedMiddleware<S>) {
        self.middleware.push(link);
    }

    /// Grafts `other` onto this node.
    ///
    /// Middleware is appended after this node's own, endpoints are added
    /// (a method registered on both sides panics), and children with the same
    /// segment are merged recursively. New children keep their order after
    /// the existing ones.
    pub(crate) fn merge(&mut self, other: Node<S>, at: &str) {
        self.middleware.extend(other.middleware);
        for (method, endpoint) in other.endpoints {
            if self.endpoints.iter().any(|(m, _)| *m == method) {
                panic!("route `{method} {at}` registered twice");
            }
            self.endpoints.push((method, endpoint));
        }
        for child in other.children {
            let child_at = join(at, &child.segment);
            match self.children.iter_mut().find(|c| c.segment == child.segment) {
                Some(existing) => existing.merge(child, &child_at),
                None => self.children.push(child),
            }
        }
    }

    /// Converts the subtree into its read-only form.
    ///
    /// # Panics
    ///
    /// Panics if a route binds the same parameter name twice, or if anything
    /// is registered below a catch-all segment.
    pub(crate) fn freeze(self) -> Frozen<S> {
        self.freeze_under(&Arc::from(Vec::new()), "/".to_owned(), &mut Vec::new())
    }

    fn freeze_under(
        self,
        parent_stack: &Arc<[BoxedMiddleware<S>]>,
        pattern: String,
        bound: &mut Vec<String>,
    ) -> Frozen<S> {
        if let Some(name) = self.segment.param_name() {
            if bound.iter().any(|b| b == name) {
                panic!("invalid route `{pattern}`: parameter `{name}` bound twice");
            }
            bound.push(name.to_owned());
        }
        if matches!(self.segment, Segment::CatchAll(_)) && !self.children.is_empty() {
            panic!("invalid route `{pattern}`: catch-all must be the last segment");
        }

        let stack = if self.middleware.is_empty() {
            Arc::clone(parent_stack)
        } else {
            parent_stack.iter().cloned().chain(self.middleware).collect()
        };
        let children = self.children.into_iter()
            .map(|child| {
                let child_pattern = join(&pattern, &child.segment);
                child.freeze_under(&stack, child_pattern, bound)
            })
            .collect();

        if self.segment.param_name().is_some() {
            bound.pop();
        }

        Frozen {
            segment: self.segment,
            pattern,
            children,
            endpoints: self.endpoints.into_boxed_slice(),
            stack,
        }
    }
}

// ── Serving phase ─────────────────────────────────────────────────────────────

/// A read-only node, shared by every in-flight request.
pub(crate) struct Frozen<S> {
    segment: Segment,
    pattern: String,
    children: Box<[Frozen<S>]>,
    endpoints: Box<[(Method, BoxedEndpoint<S>)]>,
    stack: Arc<[BoxedMiddleware<S>]>,
}

/// Outcome of resolving a request against the route tree.
pub enum Resolution<S> {
    /// A route matched both path and method.
    Matched(Matched<S>),
    /// No route matched the path. No middleware runs.
    NotFound,
    /// A route matched the path but has no endpoint for the method.
    MethodNotAllowed(AllowedMethods),
}

impl<S> fmt::Debug for Resolution<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(m) => f.debug_tuple("Matched").field(m).finish(),
            Self::NotFound => f.write_str("NotFound"),
            Self::MethodNotAllowed(allowed) => f.debug_tuple("MethodNotAllowed").field(allowed).finish(),
        }
    }
}

/// A resolved route: the endpoint, the middleware that wraps it and the
/// parameters bound from the path.
pub struct Matched<S> {
    pub(crate) pattern: String,
    pub(crate) stack: Arc<[BoxedMiddleware<S>]>,
    pub(crate) endpoint: BoxedEndpoint<S>,
    pub(crate) params: Params,
}

impl<S> Matched<S> {
    /// The registered pattern, e.g. `/api/users/{id}`.
    pub fn pattern(&self) -> &str { &self.pattern }

    pub fn params(&self) -> &Params { &self.params }

    /// Number of middleware links that will run before the endpoint.
    pub fn middleware_len(&self) -> usize { self.stack.len() }
}

impl<S> fmt::Debug for Matched<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matched")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("middleware", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<S> Frozen<S> {
    pub(crate) fn resolve(&self, method: Method, path: &str) -> Resolution<S> {
        self.resolve_for(Some(method), path)
    }

    /// Methods registered on the first route matching `path`, or `None` if
    /// no route matches it.
    pub(crate) fn allowed(&self, path: &str) -> Option<AllowedMethods> {
        match self.resolve_for(None, path) {
            Resolution::MethodNotAllowed(allowed) => Some(allowed),
            Resolution::Matched(_) | Resolution::NotFound => None,
        }
    }

    /// With `method == None` nothing is served, so the outcome is either the
    /// first path match as `MethodNotAllowed` or `NotFound`.
    fn resolve_for(&self, method: Option<Method>, path: &str) -> Resolution<S> {
        let path: Vec<&str> = segments(path).collect();
        let mut params = Params::default();
        let mut first_match = None;
        if let Some((node, endpoint)) = self.find(&path, method, &mut params, &mut first_match) {
            return Resolution::Matched(Matched {
                pattern: node.pattern.clone(),
                stack: Arc::clone(&node.stack),
                endpoint: Arc::clone(endpoint),
                params,
            });
        }
        match first_match {
            Some(node) => Resolution::MethodNotAllowed(AllowedMethods::new(
                node.endpoints.iter().map(|(m, _)| *m).collect(),
            )),
            None => Resolution::NotFound,
        }
    }

    fn endpoint(&self, method: Method) -> Option<&BoxedEndpoint<S>> {
        let lookup = |wanted: Method| {
            self.endpoints.iter().find(|(m, _)| *m == wanted).map(|(_, e)| e)
        };
        match (lookup(method), method) {
            (None, Method::Head) => lookup(Method::Get),
            (found, _) => found,
        }
    }

    /// Called once the whole path is consumed at this node.
    ///
    /// Records the first node that matches by path, so a miss on every branch
    /// can still report which methods that node offers.
    fn serve<'t>(
        &'t self,
        method: Option<Method>,
        first_match: &mut Option<&'t Self>,
    ) -> Option<(&'t Self, &'t BoxedEndpoint<S>)> {
        if self.endpoints.is_empty() {
            return None;
        }
        if let Some(endpoint) = method.and_then(|m| self.endpoint(m)) {
            return Some((self, endpoint));
        }
        first_match.get_or_insert(self);
        None
    }

    fn find<'t>(
        &'t self,
        path: &[&str],
        method: Option<Method>,
        params: &mut Params,
        first_match: &mut Option<&'t Self>,
    ) -> Option<(&'t Self, &'t BoxedEndpoint<S>)> {
        let Some((&head, rest)) = path.split_first() else {
            return self.serve(method, first_match);
        };
        for child in &self.children {
            let mark = params.len();
            let hit = match &child.segment {
                Segment::Literal(lit) if lit == head => child.find(rest, method, params, first_match),
                Segment::Literal(_) | Segment::Root => None,
                Segment::Param(name) => {
                    params.push(name, head.to_owned());
                    child.find(rest, method, params, first_match)
                }
                Segment::CatchAll(name) => {
                    params.push(name, path.join("/"));
                    child.serve(method, first_match)
                }
            };
            if hit.is_some() {
                return hit;
            }
            params.truncate(mark);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::endpoint::Endpoint;
    use crate::error::Result;
    use crate::middleware::Next;
    use crate::response::Response;

    async fn ok(_ctx: Context<()>) -> Result<Response> {
        Ok(Response::text("ok"))
    }

    async fn pass(ctx: Context<()>, next: Next<()>) -> Result {
        next.run(ctx).await
    }

    fn tree(routes: &[(Method, &str)]) -> Frozen<()> {
        let mut root = Node::root();
        for (method, pattern) in routes {
            root.insert(pattern, *method, ok.into_boxed_endpoint());
        }
        root.freeze()
    }

    fn matched(res: Resolution<()>) -> Matched<()> {
        match res {
            Resolution::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn literal_and_param_segments() {
        let t = tree(&[(Method::Get, "/users"), (Method::Get, "/users/{id}")]);
        let m = matched(t.resolve(Method::Get, "/users/42"));
        assert_eq!(m.pattern(), "/users/{id}");
        assert_eq!(m.params().get("id"), Some("42"));
        assert!(matched(t.resolve(Method::Get, "/users")).params().is_empty());
    }

    #[test]
    fn empty_segments_are_ignored() {
        let t = tree(&[(Method::Get, "/a/b"), (Method::Get, "/")]);
        assert_eq!(matched(t.resolve(Method::Get, "//a///b/")).pattern(), "/a/b");
        assert_eq!(matched(t.resolve(Method::Get, "/")).pattern(), "/");
        assert_eq!(matched(t.resolve(Method::Get, "")).pattern(), "/");
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let t = tree(&[(Method::Get, "/files/{name}"), (Method::Get, "/files/latest")]);
        assert_eq!(matched(t.resolve(Method::Get, "/files/latest")).pattern(), "/files/{name}");

        let t = tree(&[(Method::Get, "/files/latest"), (Method::Get, "/files/{name}")]);
        assert_eq!(matched(t.resolve(Method::Get, "/files/latest")).pattern(), "/files/latest");
    }

    #[test]
    fn dead_ends_fall_through_without_leaking_params() {
        let t = tree(&[(Method::Get, "/{org}/settings"), (Method::Get, "/{user}/profile")]);
        let m = matched(t.resolve(Method::Get, "/ada/profile"));
        assert_eq!(m.pattern(), "/{user}/profile");
        assert_eq!(m.params().iter().collect::<Vec<_>>(), [("user", "ada")]);
    }

    #[test]
    fn catch_all_binds_the_remainder() {
        let t = tree(&[(Method::Get, "/static/{*path}")]);
        let m = matched(t.resolve(Method::Get, "/static/css/site.css"));
        assert_eq!(m.params().get("path"), Some("css/site.css"));
        assert!(matches!(t.resolve(Method::Get, "/static"), Resolution::NotFound));
    }

    #[test]
    fn node_without_endpoints_is_not_found() {
        let t = tree(&[(Method::Get, "/api/users")]);
        assert!(matches!(t.resolve(Method::Get, "/api"), Resolution::NotFound));
        assert!(matches!(t.resolve(Method::Get, "/api/users/1"), Resolution::NotFound));
    }

    #[test]
    fn wrong_method_lists_registered_ones() {
        let t = tree(&[(Method::Post, "/items"), (Method::Delete, "/items")]);
        match t.resolve(Method::Put, "/items") {
            Resolution::MethodNotAllowed(allowed) => {
                assert_eq!(allowed.methods(), &[Method::Post, Method::Delete]);
            }
            other => panic!("expected 405, got {other:?}"),
        }
    }

    #[test]
    fn later_route_with_the_method_beats_earlier_path_match() {
        let t = tree(&[(Method::Get, "/files/{name}"), (Method::Post, "/files/latest")]);
        let m = matched(t.resolve(Method::Post, "/files/latest"));
        assert_eq!(m.pattern(), "/files/latest");
        assert!(m.params().is_empty());
        assert_eq!(matched(t.resolve(Method::Get, "/files/latest")).pattern(), "/files/{name}");
    }

    #[test]
    fn method_miss_everywhere_reports_the_first_path_match() {
        let t = tree(&[(Method::Get, "/files/{name}"), (Method::Post, "/files/latest")]);
        match t.resolve(Method::Delete, "/files/latest") {
            Resolution::MethodNotAllowed(allowed) => {
                assert_eq!(allowed.methods(), &[Method::Get, Method::Head]);
            }
            other => panic!("expected 405, got {other:?}"),
        }
    }

    #[test]
    fn head_fallback_counts_as_serving() {
        let t = tree(&[(Method::Post, "/{page}"), (Method::Get, "/about")]);
        assert_eq!(matched(t.resolve(Method::Head, "/about")).pattern(), "/about");
    }

    #[test]
    fn allowed_lists_methods_or_nothing() {
        let t = tree(&[(Method::Post, "/items"), (Method::Put, "/items")]);
        assert_eq!(t.allowed("/items").unwrap().methods(), &[Method::Post, Method::Put]);
        assert!(t.allowed("/other").is_none());
    }

    #[test]
    fn head_falls_back_to_get() {
        let t = tree(&[(Method::Get, "/")]);
        assert_eq!(matched(t.resolve(Method::Head, "/")).pattern(), "/");
    }

    #[test]
    fn stacks_accumulate_root_first() {
        let mut root = Node::<()>::root();
        root.add_middleware(Arc::new(pass));
        root.descend("/api").add_middleware(Arc::new(pass));
        root.descend("/api").add_middleware(Arc::new(pass));
        root.insert("/api/users", Method::Get, ok.into_boxed_endpoint());
        root.insert("/health", Method::Get, ok.into_boxed_endpoint());
        let t = root.freeze();

        assert_eq!(matched(t.resolve(Method::Get, "/api/users")).middleware_len(), 3);
        assert_eq!(matched(t.resolve(Method::Get, "/health")).middleware_len(), 1);
    }

    #[test]
    fn merge_combines_subtrees() {
        let mut root = Node::<()>::root();
        root.insert("/api/a", Method::Get, ok.into_boxed_endpoint());
        let mut other = Node::root();
        other.add_middleware(Arc::new(pass));
        other.insert("/b", Method::Get, ok.into_boxed_endpoint());
        root.descend("/api").merge(other, "/api");
        let t = root.freeze();

        assert_eq!(matched(t.resolve(Method::Get, "/api/a")).middleware_len(), 1);
        assert_eq!(matched(t.resolve(Method::Get, "/api/b")).pattern(), "/api/b");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_route_panics() {
        tree(&[(Method::Get, "/x"), (Method::Get, "/x/")]);
    }

    #[test]
    #[should_panic(expected = "bound twice")]
    fn duplicate_param_panics() {
        tree(&[(Method::Get, "/{id}/items/{id}")]);
    }

    #[test]
    #[should_panic(expected = "unterminated parameter")]
    fn unterminated_param_panics() {
        tree(&[(Method::Get, "/{id")]);
    }

    #[test]
    #[should_panic(expected = "catch-all must be the last segment")]
    fn segments_after_catch_all_panic() {
        tree(&[(Method::Get, "/{*rest}/more")]);
    }
}
