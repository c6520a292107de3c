//! Endpoint trait and type erasure.
//!
//! # How async endpoints are stored
//!
//! The route tree holds endpoints of *different* types side by side, so each
//! one is hidden behind a trait object (`dyn ErasedEndpoint<S>`) and stored
//! uniformly.
//!
//! ```text
//! async fn hello(ctx: Context<S>) -> Result<Response> { … }   ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_endpoint()                                 ← Endpoint blanket impl
//!        ↓
//! Arc::new(FnEndpoint(hello))                                 ← heap-allocated wrapper
//!        ↓  stored as BoxedEndpoint<S> = Arc<dyn ErasedEndpoint<S>>
//! endpoint.call(ctx)  at request time                         ← one vtable dispatch
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`] or a
/// failure.
///
/// `Send` lets tokio move the future across worker threads.
pub type BoxFuture<'a, T = Result<Response>> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Endpoint` trait's `into_boxed_endpoint` method.
#[doc(hidden)]
pub trait ErasedEndpoint<S> {
    fn call(&self, ctx: Context<S>) -> BoxFuture<'static>;
}

/// A type-erased endpoint shared across concurrent requests.
#[doc(hidden)]
pub type BoxedEndpoint<S> = Arc<dyn ErasedEndpoint<S> + Send + Sync + 'static>;

// ── Public Endpoint trait ─────────────────────────────────────────────────────

/// Implemented for every valid route endpoint.
///
/// You never implement this yourself. It is satisfied by any `async fn`
/// (or closure returning a future) with the shape:
///
/// ```text
/// async fn name(ctx: Context<S>) -> kumi::Result<impl IntoResponse>
/// ```
///
/// The trait is **sealed**: only the blanket impl below satisfies it.
pub trait Endpoint<S>: private::Sealed<S> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_endpoint(self) -> BoxedEndpoint<S>;
}

mod private {
    pub trait Sealed<S> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<S, F, Fut, R> private::Sealed<S> for F
where
    S: Send + Sync + 'static,
    F: Fn(Context<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + 'static,
{
}

impl<S, F, Fut, R> Endpoint<S> for F
where
    S: Send + Sync + 'static,
    F: Fn(Context<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + 'static,
{
    fn into_boxed_endpoint(self) -> BoxedEndpoint<S> {
        Arc::new(FnEndpoint(self, PhantomData))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete endpoint `F` to the trait-object world.
///
/// `PhantomData<fn() -> S>` ties the wrapper to its state type without
/// affecting `Send`/`Sync`.
struct FnEndpoint<F, S>(F, PhantomData<fn() -> S>);

impl<S, F, Fut, R> ErasedEndpoint<S> for FnEndpoint<F, S>
where
    F: Fn(Context<S>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: IntoResponse + 'static,
{
    fn call(&self, ctx: Context<S>) -> BoxFuture<'static> {
        let fut = (self.0)(ctx);
        Box::pin(async move { fut.await.map(IntoResponse::into_response) })
    }
}
