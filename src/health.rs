//! Built-in health-check endpoints.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Probes are usually mounted on the root, outside any authenticated scope:
//!
//! ```rust
//! use kumi::{Router, health};
//!
//! let app = Router::<()>::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness)
//!     .into_app(());
//! ```
//!
//! Replace `readiness` with your own endpoint to gate on dependencies; the
//! shared state is right there on the context:
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use kumi::{Context, Response, StatusCode};
//!
//! struct State { warmed_up: AtomicBool }
//!
//! async fn readiness(ctx: Context<State>) -> kumi::Result<Response> {
//!     Ok(if ctx.state().warmed_up.load(Ordering::Acquire) {
//!         Response::text("ready")
//!     } else {
//!         Response::status(StatusCode::SERVICE_UNAVAILABLE)
//!     })
//! }
//! ```

use crate::{Context, Response, Result};

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub async fn liveness<S>(_ctx: Context<S>) -> Result<Response> {
    Ok(Response::text("ok"))
}

/// Readiness probe (default implementation). `200 OK` with body `"ready"`.
pub async fn readiness<S>(_ctx: Context<S>) -> Result<Response> {
    Ok(Response::text("ready"))
}
