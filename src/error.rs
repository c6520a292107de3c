//! Unified error type.

/// Boxed error produced by application code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used by endpoints, middleware and dispatch.
///
/// Defaults to `Result<Response>` so middleware signatures stay short.
pub type Result<T = crate::Response> = std::result::Result<T, Error>;

/// The error type returned by kumi's fallible operations.
///
/// Routing failures (404, 405) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures and failures raised by endpoints or middleware.
/// kumi never maps a [`Error::Handler`] to a status code itself; the server
/// does that at the transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("body: {0}")]
    Body(#[from] hyper::Error),

    #[error("handler: {0}")]
    Handler(#[source] BoxError),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),
}

impl Error {
    /// Wraps an application error raised inside an endpoint or middleware.
    ///
    /// ```rust
    /// # use kumi::{Context, Error, Response};
    /// async fn load(ctx: Context<()>) -> kumi::Result<Response> {
    ///     let n: u32 = ctx.param("n").unwrap_or("x").parse().map_err(Error::handler)?;
    ///     Ok(Response::text(n.to_string()))
    /// }
    /// ```
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// A handler error carrying only a message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into().into())
    }
}
