//! Minimal kumi example: a public root, an authenticated `/api` scope and
//! health checks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/api/users/42                     # 401
//!   curl -H 'authorization: Bearer demo' http://localhost:3000/api/users/42
//!   curl -X POST -H 'authorization: Bearer demo' http://localhost:3000/api/users \
//!        -d '{"name":"alice"}'
//!   curl -X PUT http://localhost:3000/healthz                   # 405, allow: GET, HEAD

use std::sync::atomic::{AtomicU64, Ordering};

use kumi::middleware::{Next, Trace};
use kumi::{Context, Cookies, Response, Router, Server, StatusCode, health};

#[derive(Default)]
struct State {
    created: AtomicU64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .with(Trace)
        .get("/", index)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .scope("/api", |api| api
            .with(bearer_auth)
            .with(no_store)
            .get("/users/{id}", get_user)
            .post("/users", create_user)
            .delete("/users/{id}", delete_user))
        .into_app(State::default());

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /
async fn index(ctx: Context<State>) -> kumi::Result<Response> {
    let cookies = ctx.compute::<Cookies>()?;
    let name = cookies.get("name").unwrap_or("stranger");
    Ok(Response::text(format!("hello, {name}")))
}

// Short-circuits every /api route without a bearer token.
async fn bearer_auth(ctx: Context<State>, next: Next<State>) -> kumi::Result<Response> {
    match ctx.request().header("authorization") {
        Some(v) if v.starts_with("Bearer ") => next.run(ctx).await,
        _ => Ok(Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header("www-authenticate", "Bearer")
            .no_body()),
    }
}

// Rewrites the response on the way out.
async fn no_store(ctx: Context<State>, next: Next<State>) -> kumi::Result<Response> {
    let mut res = next.run(ctx).await?;
    res.set_header("cache-control", "no-store");
    Ok(res)
}

// GET /api/users/{id}
async fn get_user(ctx: Context<State>) -> kumi::Result<Response> {
    let id = ctx.param("id").unwrap_or("unknown");
    Ok(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#)))
}

// POST /api/users
async fn create_user(ctx: Context<State>) -> kumi::Result<Response> {
    if ctx.request().body().is_empty() {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    }
    let id = ctx.state().created.fetch_add(1, Ordering::Relaxed) + 100;
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("location", &format!("/api/users/{id}"))
        .json(format!(r#"{{"id":"{id}"}}"#)))
}

// DELETE /api/users/{id} → 204 No Content
async fn delete_user(_ctx: Context<State>) -> kumi::Result<StatusCode> {
    Ok(StatusCode::NO_CONTENT)
}
