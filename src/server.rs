//! HTTP transport and graceful shutdown.
//!
//! The server owns everything [`App`] does not: sockets, HTTP/1.1 and HTTP/2
//! framing, reading request bodies, and turning a failed dispatch into a
//! `500 Internal Server Error`.
//!
//! # Graceful shutdown
//!
//! By default the server stops on **SIGTERM** (Kubernetes, systemd) or
//! **Ctrl-C**. It then:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to shut down: requests in flight finish,
//!    idle keep-alive connections are closed.
//! 3. Returns from [`Server::serve`] once every connection is gone, which
//!    lets `main` exit cleanly.
//!
//! [`Server::with_shutdown`] swaps the signal for any future, which is how
//! tests and embedding applications stop the server.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::app::{self, App};
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;

type Shutdown = Pin<Box<dyn Future<Output = ()> + Send>>;

enum Listen {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    listen: Listen,
    shutdown: Shutdown,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use kumi::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self::with_listen(Listen::Addr(addr))
    }

    /// Serves on an already bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self::with_listen(Listen::Listener(listener))
    }

    fn with_listen(listen: Listen) -> Self {
        Self { listen, shutdown: Box::pin(shutdown_signal()) }
    }

    /// Stops accepting connections once `signal` resolves, instead of on
    /// SIGTERM / Ctrl-C.
    pub fn with_shutdown(mut self, signal: impl Future<Output = ()> + Send + 'static) -> Self {
        self.shutdown = Box::pin(signal);
        self
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown: the shutdown signal,
    /// followed by in-flight requests completing and every connection,
    /// including idle keep-alive ones, being closed.
    pub async fn serve<S: Send + Sync + 'static>(self, app: App<S>) -> Result<(), Error> {
        let listener = match self.listen {
            Listen::Addr(addr) => TcpListener::bind(addr).await?,
            Listen::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;

        info!(%addr, "kumi listening");

        // HTTP/1.1 or HTTP/2, whichever the client speaks.
        let builder = ConnBuilder::new(TokioExecutor::new());
        // Watches every connection so shutdown can close idle ones.
        let graceful = GracefulShutdown::new();
        // Every spawned connection task, so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();
        let mut shutdown = self.shutdown;

        loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops accepting
                // new connections, even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = app.clone();
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let app = app.clone();
                        async move { Ok::<_, Infallible>(handle(&app, req, peer).await) }
                    });
                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("kumi stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Translates one hyper request into a dispatch and the outcome back into hyper.
///
/// Never fails: unknown methods become `405` (with the path's `allow` list)
/// or `404` when no route matches the path, unreadable bodies `400`, and a
/// dispatch error `500`.
async fn handle<S: Send + Sync + 'static>(
    app: &App<S>,
    req: hyper::Request<hyper::body::Incoming>,
    peer: SocketAddr,
) -> http::Response<Full<Bytes>> {
    let Ok(method) = Method::try_from(req.method()) else {
        warn!(%peer, method = %req.method(), path = req.uri().path(), "unsupported method");
        return match app.allowed(req.uri().path()) {
            Some(allowed) => app::method_not_allowed(&allowed).into_inner(),
            None => Response::status(StatusCode::NOT_FOUND).into_inner(),
        };
    };

    let req = match Request::from_hyper(method, req).await {
        Ok(req) => req,
        Err(e) => {
            warn!(%peer, "failed to read request: {e}");
            return Response::status(StatusCode::BAD_REQUEST).into_inner();
        }
    };

    let (method, path) = (req.method(), req.path().to_owned());
    match app.dispatch(req).await {
        Ok(res) => res.into_inner(),
        Err(e) => {
            error!(%peer, %method, %path, "request failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR).into_inner()
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and treated as a signal that never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
