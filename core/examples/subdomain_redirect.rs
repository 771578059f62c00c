//! Subdomain Redirect Example
//!
//! Demonstrates virtual-host isolation (spec §4.8 rationale): a route-mode
//! request gets redirected to the encoded-subdomain form of its backend,
//! and a subsequent host-mode request to that encoded subdomain proxies
//! straight through.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example subdomain_redirect
//! ```

use gateway_core::{route_parser, BackendUrl, Gateway, GatewayConfig, GatewayOutcome};
use hyper::{Body, Request};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    println!("Starting gateway-core subdomain redirect example");

    let backend_port = spawn_stub_backend().await;
    let config = GatewayConfig::builder().gateway_host("example.com").build();
    let gateway = Gateway::new(
        config,
        route_parser(move |ctx| {
            if ctx.path_and_query().starts_with("/backend/") {
                Some(BackendUrl::parse(&format!("http://127.0.0.1:{backend_port}/x")).unwrap())
            } else {
                None
            }
        }),
    );

    // Route mode: expect a 302 to the encoded subdomain.
    let route_req = Request::builder().method("GET").uri("/backend/x").header(hyper::header::HOST, "example.com").body(Body::empty()).unwrap();
    let location = match gateway.handle(route_req, "http", "/backend").await {
        GatewayOutcome::Response(resp) => {
            println!("route-mode status: {}", resp.status());
            resp.headers().get(hyper::header::LOCATION).unwrap().to_str().unwrap().to_string()
        }
        GatewayOutcome::PassThrough(_) => panic!("expected a redirect"),
    };
    println!("redirected to: {location}");

    // Host mode: replay the encoded subdomain as the Host header.
    let encoded_host = location.strip_prefix("http://").unwrap().split('/').next().unwrap().to_string();
    let host_req = Request::builder().method("GET").uri("/x").header(hyper::header::HOST, encoded_host.clone()).body(Body::empty()).unwrap();
    match gateway.handle(host_req, "http", "/backend").await {
        GatewayOutcome::Response(resp) => {
            let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
            println!("host-mode ({encoded_host}) -> {}", String::from_utf8_lossy(&body));
        }
        GatewayOutcome::PassThrough(_) => println!("host-mode request was not intercepted"),
    }
}

async fn spawn_stub_backend() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = "hello from backend";
            let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });
    port
}
