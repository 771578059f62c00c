//! TCP Tunnel Engine (spec §4.7): a raw socket bridge to a configured
//! backend, present but not dispatched by the default middleware (spec §9
//! Open Question — exposed for hosts that dispatch CONNECT-style traffic
//! themselves).
//!
//! Grounded in `forwarder.rs`'s `start_tcp_forwarder`: accept, dial,
//! `copy_bidirectional`, mutual close — adapted to bridge a single already-
//! accepted client connection to one resolved backend instead of running a
//! standing listener per configured port.

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::events::GatewayEvents;
use log::Level;
use tokio::net::TcpStream;

/// Bridge `client` to `backend_host:backend_port`, splicing bidirectionally
/// until either side closes. Returns once the tunnel has torn down.
///
/// Callers are responsible for checking `backend_port` against
/// [`GatewayConfig::socket_ports`] before invoking this — the engine
/// itself does not enforce the allow-list, since spec §4.7 describes it as
/// "a raw socket bridge to a configured port list", not a self-policing
/// one.
pub async fn tunnel_tcp(mut client: TcpStream, backend_host: &str, backend_port: u16, events: &GatewayEvents) -> Result<(), GatewayError> {
    let mut upstream = TcpStream::connect((backend_host, backend_port))
        .await
        .map_err(|e| GatewayError::upstream_connect(e.kind(), format!("connect to {backend_host}:{backend_port} failed: {e}")))?;

    events.log(Level::Debug, format!("tcp tunnel established to {backend_host}:{backend_port}"));

    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((from_client, from_backend)) => {
            events.log(Level::Debug, format!("tcp tunnel to {backend_host}:{backend_port} closed ({from_client}b up, {from_backend}b down)"));
            Ok(())
        }
        Err(e) => Err(GatewayError::UpstreamTransport(e.to_string())),
    }
}

/// Whether `port` is in the gateway's configured TCP-tunnel allow-list.
pub fn port_allowed(config: &GatewayConfig, port: u16) -> bool {
    config.socket_ports.contains(&port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_allowed_checks_config_list() {
        let config = GatewayConfig::builder().socket_ports(vec![2222, 3333]).build();
        assert!(port_allowed(&config, 2222));
        assert!(!port_allowed(&config, 4444));
    }
}
