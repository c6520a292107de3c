//! End-to-end tests over a real socket, speaking raw HTTP/1.1.

use kumi::middleware::{Next, Trace};
use kumi::{Context, Error, Response, Router, Server, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

async fn hello(ctx: Context<()>) -> kumi::Result<Response> {
    Ok(Response::text(format!("hello {}", ctx.param("name").unwrap_or("?"))))
}

async fn echo(ctx: Context<()>) -> kumi::Result<Response> {
    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .bytes("application/octet-stream", ctx.request().body().to_vec()))
}

async fn fail(_ctx: Context<()>) -> kumi::Result<Response> {
    Err(Error::msg("boom"))
}

async fn stamp(ctx: Context<()>, next: Next<()>) -> kumi::Result {
    let mut res = next.run(ctx).await?;
    res.set_header("x-served-by", "kumi");
    Ok(res)
}

struct Running {
    addr: std::net::SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), Error>>,
}

async fn start() -> Running {
    let app = Router::new()
        .with(Trace)
        .scope("/api", |api| api
            .with(stamp)
            .get("/hello/{name}", hello)
            .post("/echo", echo)
            .get("/fail", fail))
        .into_app(());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(
        Server::from_listener(listener)
            .with_shutdown(async move { let _ = stopped.await; })
            .serve(app),
    );
    Running { addr, stop, handle }
}

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n")
}

#[tokio::test]
async fn serves_scoped_routes_through_middleware() {
    let server = start().await;

    let res = roundtrip(server.addr, &get("/api/hello/ada")).await;

    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
    assert!(res.to_ascii_lowercase().contains("x-served-by: kumi"), "{res}");
    assert!(res.ends_with("hello ada"), "{res}");

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn reads_request_bodies() {
    let server = start().await;

    let res = roundtrip(
        server.addr,
        "POST /api/echo HTTP/1.1\r\nhost: test\r\ncontent-length: 5\r\nconnection: close\r\n\r\nabcde",
    )
    .await;

    assert!(res.starts_with("HTTP/1.1 201 Created\r\n"), "{res}");
    assert!(res.ends_with("abcde"), "{res}");

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn maps_routing_failures_and_errors_to_statuses() {
    let server = start().await;

    let missing = roundtrip(server.addr, &get("/nope")).await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"), "{missing}");

    let wrong = roundtrip(
        server.addr,
        "DELETE /api/echo HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(wrong.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"), "{wrong}");
    assert!(wrong.to_ascii_lowercase().contains("allow: post"), "{wrong}");

    let failed = roundtrip(server.addr, &get("/api/fail")).await;
    assert!(failed.starts_with("HTTP/1.1 500 Internal Server Error\r\n"), "{failed}");

    let unknown = roundtrip(
        server.addr,
        "PURGE /api/echo HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(unknown.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"), "{unknown}");
    assert!(unknown.to_ascii_lowercase().contains("allow: post"), "{unknown}");

    let unknown_path = roundtrip(
        server.addr,
        "PURGE /nope HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n",
    )
    .await;
    assert!(unknown_path.starts_with("HTTP/1.1 404 Not Found\r\n"), "{unknown_path}");

    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let server = start().await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /api/hello/ada HTTP/1.1\r\nhost: test\r\n\r\n")
        .await
        .unwrap();
    let mut seen = Vec::new();
    let mut buf = [0u8; 1024];
    while !String::from_utf8_lossy(&seen).ends_with("hello ada") {
        let n = stream.read(&mut buf).await.unwrap();
        assert_ne!(n, 0, "connection closed before the response");
        seen.extend_from_slice(&buf[..n]);
    }

    // The connection stays open and idle while the server stops.
    server.stop.send(()).unwrap();
    let served = timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("serve did not return with an idle connection open");
    served.unwrap().unwrap();

    let n = stream.read(&mut buf).await.unwrap_or(0);
    assert_eq!(n, 0);
}
