//! Basic Proxy Example
//!
//! Demonstrates the simplest way to use `gateway-core`: a default
//! `GatewayConfig`, a route-resolution closure lifted via `route_parser`,
//! and a single `Gateway::handle` call. A tiny in-process TCP listener
//! stands in for the real backend so the example is self-contained.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic_proxy
//! ```

use gateway_core::{route_parser, BackendUrl, Gateway, GatewayConfig, GatewayOutcome};
use hyper::{Body, Request};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    println!("Starting basic gateway-core proxy example");

    let backend_port = spawn_stub_backend().await;
    println!("Stub backend listening on 127.0.0.1:{backend_port}");

    let gateway = Gateway::new(
        GatewayConfig::default(),
        route_parser(move |ctx| {
            if ctx.path_and_query().starts_with("/backend/") {
                Some(BackendUrl::parse(&format!("http://127.0.0.1:{backend_port}/greeting")).unwrap())
            } else {
                None
            }
        }),
    );

    let req = Request::builder().method("GET").uri("/backend/foo").header(hyper::header::HOST, "gateway.example.com").body(Body::empty()).unwrap();

    match gateway.handle(req, "http", "/backend").await {
        GatewayOutcome::Response(resp) => {
            println!("Response status: {}", resp.status());
            let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
            println!("Response body: {}", String::from_utf8_lossy(&body));
        }
        GatewayOutcome::PassThrough(_) => println!("Request was not intercepted"),
    }
}

async fn spawn_stub_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let body = "hello from backend";
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
        let _ = socket.write_all(response.as_bytes()).await;
    });
    port
}
