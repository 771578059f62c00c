//! Route Filtering Example
//!
//! Demonstrates the filter hook run between classification Phase 1 and
//! Phase 2 (spec §4.4/§4.8): a filter that vetoes interception for any
//! request carrying an `X-Internal-Only` header not present in an
//! allow-list, leaving it to pass through untouched.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example route_filtering
//! ```

use gateway_core::{route_parser, BackendUrl, FilterOutcome, Gateway, GatewayConfig, GatewayOutcome, RequestInfo};
use hyper::{Body, Request};

fn deny_untrusted_clients(_info: &RequestInfo, req: &Request<Body>) -> FilterOutcome {
    match req.headers().get("x-client-id").and_then(|v| v.to_str().ok()) {
        Some("trusted-dashboard") => FilterOutcome::Proceed,
        _ => FilterOutcome::Veto,
    }
}

#[tokio::main]
async fn main() {
    println!("Starting gateway-core route filtering example");

    let gateway = Gateway::new(
        GatewayConfig::default(),
        route_parser(|ctx| {
            if ctx.path_and_query().starts_with("/backend/") {
                Some(BackendUrl::parse("http://127.0.0.1:9999/x").unwrap())
            } else {
                None
            }
        }),
    )
    .with_filter(deny_untrusted_clients);

    let untrusted = Request::builder().method("GET").uri("/backend/secrets").body(Body::empty()).unwrap();
    match gateway.handle(untrusted, "http", "/backend").await {
        GatewayOutcome::PassThrough(_) => println!("untrusted request: correctly passed through, not proxied"),
        GatewayOutcome::Response(_) => println!("untrusted request: unexpectedly intercepted"),
    }

    let trusted = Request::builder().method("GET").uri("/backend/secrets").header("x-client-id", "trusted-dashboard").body(Body::empty()).unwrap();
    match gateway.handle(trusted, "http", "/backend").await {
        GatewayOutcome::PassThrough(_) => println!("trusted request: unexpectedly passed through"),
        GatewayOutcome::Response(resp) => println!("trusted request: intercepted, upstream attempt returned status {}", resp.status()),
    }
}
