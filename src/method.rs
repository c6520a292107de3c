//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods. Requests carrying any other method
//! are rejected by the server with `405 Method Not Allowed` before routing.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A known HTTP method.
///
/// Variants are declared in the order used when rendering an `Allow` header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            other     => Err(Error::UnknownMethod(other.to_owned())),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── AllowedMethods ────────────────────────────────────────────────────────────

/// The methods registered at a matched path, attached to a
/// `405 Method Not Allowed` outcome.
///
/// Sorted and de-duplicated. `HEAD` is included whenever `GET` is, because a
/// `GET` endpoint also answers `HEAD`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowedMethods(Vec<Method>);

impl AllowedMethods {
    pub(crate) fn new(mut methods: Vec<Method>) -> Self {
        if methods.contains(&Method::Get) && !methods.contains(&Method::Head) {
            methods.push(Method::Head);
        }
        methods.sort_unstable();
        methods.dedup();
        Self(methods)
    }

    pub fn methods(&self) -> &[Method] { &self.0 }

    pub fn contains(&self, method: Method) -> bool { self.0.contains(&method) }

    /// Renders the set as an `Allow` header value: `GET, HEAD, POST`.
    pub fn header_value(&self) -> String {
        self.0.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!(Method::try_from(&http::Method::DELETE).unwrap(), Method::Delete);
    }

    #[test]
    fn rejects_lowercase_and_unknown() {
        assert!(matches!("get".parse::<Method>(), Err(Error::UnknownMethod(m)) if m == "get"));
        let purge = http::Method::from_bytes(b"PURGE").unwrap();
        assert!(Method::try_from(&purge).is_err());
    }

    #[test]
    fn allowed_methods_add_head_and_sort() {
        let allowed = AllowedMethods::new(vec![Method::Post, Method::Get, Method::Post]);
        assert_eq!(allowed.methods(), &[Method::Get, Method::Head, Method::Post]);
        assert_eq!(allowed.header_value(), "GET, HEAD, POST");
        assert!(allowed.contains(Method::Head));
    }
}
