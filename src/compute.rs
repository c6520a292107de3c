//! Computed values: typed data derived from a request on demand.
//!
//! A lighter tool than middleware for simple derivations. A computed value
//! only reads the context, so it can be taken in any order, from any link or
//! endpoint, without a middleware having run first.
//!
//! ```rust
//! use kumi::{Context, Cookies, Response};
//!
//! async fn whoami(ctx: Context<()>) -> kumi::Result<Response> {
//!     let cookies = ctx.compute::<Cookies>()?;
//!     Ok(Response::text(cookies.get("user").unwrap_or("anonymous").to_owned()))
//! }
//! ```

use cookie::Cookie;

use crate::context::Context;
use crate::error::Error;

/// A value that can be derived from a [`Context`].
///
/// Nothing is cached: each `compute` call derives the value again.
pub trait FromContext<S>: Sized {
    fn from_context(ctx: &Context<S>) -> Result<Self, Error>;
}

impl<S> Context<S> {
    /// Derives `T` from this context.
    pub fn compute<T: FromContext<S>>(&self) -> Result<T, Error> {
        T::from_context(self)
    }
}

/// Cookies sent with the request, parsed from every `cookie` header.
///
/// Names and values are percent-decoded and surrounding double quotes are
/// dropped from values. Malformed pairs (no `=`, empty name) are ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cookies(Vec<(String, String)>);

impl Cookies {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<S> FromContext<S> for Cookies {
    fn from_context(ctx: &Context<S>) -> Result<Self, Error> {
        let pairs = ctx.request().headers().iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| Cookie::split_parse_encoded(v.as_str()))
            .filter_map(|parsed| parsed.ok())
            .map(|c| (c.name().to_owned(), c.value_trimmed().to_owned()))
            .collect();
        Ok(Self(pairs))
    }
}
