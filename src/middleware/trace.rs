//! Per-request tracing span with method, path, status and latency.

use std::time::Instant;

use tracing::{Instrument, error, info, info_span};

use crate::context::Context;
use crate::endpoint::BoxFuture;

use super::{Middleware, Next};

/// Wraps the rest of the chain in a `request` span and logs its outcome.
///
/// Register it first on the root so the span covers every other link:
///
/// ```rust
/// use kumi::{Router, middleware::Trace};
///
/// let app = Router::<()>::new().with(Trace);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl<S: Send + Sync + 'static> Middleware<S> for Trace {
    fn handle<'a>(&'a self, ctx: Context<S>, next: Next<S>) -> BoxFuture<'a> {
        let span = info_span!(
            "request",
            method = %ctx.request().method(),
            path = ctx.request().path(),
        );
        Box::pin(
            async move {
                let started = Instant::now();
                let res = next.run(ctx).await;
                let latency_us = started.elapsed().as_micros() as u64;
                match &res {
                    Ok(r) => info!(status = r.status_code().as_u16(), latency_us, "request finished"),
                    Err(e) => error!(error = %e, latency_us, "request failed"),
                }
                res
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, Request, Response, Router};

    async fn hi(_ctx: Context<()>) -> crate::Result<Response> {
        Ok(Response::text("hi"))
    }

    #[tokio::test]
    async fn passes_the_response_through() {
        let app = Router::new().with(Trace).get("/", hi).into_app(());

        let res = app.dispatch(Request::new(Method::Get, "/")).await.unwrap();

        assert_eq!(res.body(), b"hi");
    }
}
