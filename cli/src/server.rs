//! Wires `gateway-core`'s [`Gateway`] into a real `hyper::Server`, the
//! "host HTTP server framework" spec §1 treats as an external collaborator.
//! Grounded directly in the teacher's `cli/src/proxy/http_server.rs`:
//! `make_service_fn`/`service_fn` over `AddrStream`, rebuilt each retry
//! through the bind loop so a transient bind failure doesn't kill the
//! process.

use anyhow::Result;
use gateway_core::{Gateway, GatewayOutcome};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, StatusCode};
use log::{error, info};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Serve forever on `addr`, dispatching every request through the current
/// `Gateway` in `state`. A request the gateway does not intercept (`PASS`)
/// is answered `404`, since this demo binary is itself the full host
/// framework — there is no further routing layer beneath the gateway.
pub async fn run(addr: SocketAddr, mount_prefix: String, state: Arc<RwLock<Arc<Gateway>>>) -> Result<()> {
    loop {
        let state = state.clone();
        let mount_prefix = mount_prefix.clone();

        let make_svc = make_service_fn(move |_conn: &AddrStream| {
            let state = state.clone();
            let mount_prefix = mount_prefix.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let state = state.clone();
                    let mount_prefix = mount_prefix.clone();
                    async move { Ok::<_, Infallible>(dispatch(&state, &mount_prefix, req).await) }
                }))
            }
        });

        let builder = match hyper::Server::try_bind(&addr) {
            Ok(b) => b,
            Err(e) => {
                error!("failed to bind gatewayd on {addr}: {e}");
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        let server = builder.serve(make_svc);
        info!("gatewayd listening on {addr}");

        if let Err(e) = server.await {
            error!("server error: {e}");
            // loop retries bind/serve
        }
    }
}

async fn dispatch(state: &RwLock<Arc<Gateway>>, mount_prefix: &str, req: Request<Body>) -> Response<Body> {
    let gateway = state.read().await.clone();
    let scheme = if req.uri().scheme_str() == Some("https") { "https" } else { "http" };
    match gateway.handle(req, scheme, mount_prefix).await {
        GatewayOutcome::Response(resp) => resp,
        GatewayOutcome::PassThrough(_) => Response::builder().status(StatusCode::NOT_FOUND).body(Body::from("no route")).unwrap_or_else(|_| Response::new(Body::empty())),
    }
}
