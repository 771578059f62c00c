//! Custom Configuration Example
//!
//! Demonstrates a hand-written `BackendParser` implementation (rather than
//! a lifted closure) paired with a `GatewayConfigBuilder` that overrides
//! the gateway's host and subdomain.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example custom_config
//! ```

use gateway_core::parser::RequestContext;
use gateway_core::{BackendParser, BackendUrl, Gateway, GatewayConfig, GatewayOutcome};
use hyper::{Body, Request};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Routes everything under `/api` to one backend port and everything else
/// under `/backend` to another — the kind of multi-service split a bare
/// closure can't express as cleanly as a full parser.
struct SplitParser {
    api_port: u16,
    default_port: u16,
}

impl BackendParser for SplitParser {
    fn parse_url_from_route(&self, ctx: &RequestContext) -> Option<BackendUrl> {
        let path = ctx.path_and_query();
        if let Some(rest) = path.strip_prefix("/api") {
            return Some(BackendUrl::parse(&format!("http://127.0.0.1:{}{}", self.api_port, if rest.is_empty() { "/" } else { rest })).unwrap());
        }
        if let Some(rest) = path.strip_prefix("/backend") {
            let rest = if rest.is_empty() { "/" } else { rest };
            return Some(BackendUrl::parse(&format!("http://127.0.0.1:{}{}", self.default_port, rest)).unwrap());
        }
        None
    }
}

#[tokio::main]
async fn main() {
    println!("Starting gateway-core custom configuration example");

    let api_port = spawn_stub_backend("api").await;
    let default_port = spawn_stub_backend("default").await;

    let config = GatewayConfig::builder().gateway_host("gateway.example.com").gateway_subdomain("px").force_http(true).build();
    let gateway = Gateway::new(config, SplitParser { api_port, default_port });

    for path in ["/api/users", "/backend/home"] {
        let req = Request::builder().method("GET").uri(path).header(hyper::header::HOST, "gateway.example.com").body(Body::empty()).unwrap();
        match gateway.handle(req, "http", "/backend").await {
            GatewayOutcome::Response(resp) => {
                let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
                println!("{path} -> {}", String::from_utf8_lossy(&body));
            }
            GatewayOutcome::PassThrough(_) => println!("{path} -> not intercepted"),
        }
    }
}

async fn spawn_stub_backend(name: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let body = format!("hello from {name} backend");
        let response = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
        let _ = socket.write_all(response.as_bytes()).await;
    });
    port
}
