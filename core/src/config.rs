//! Process-wide gateway configuration. Immutable once built (spec §3:
//! "process-wide, immutable after construction"), serializable so a host
//! binary can load/persist it as JSON the way `minipx`'s own `Config` does.

use serde::{Deserialize, Serialize};

fn default_gateway_subdomain() -> String {
    "gateway-proxy".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Explicit authority of the gateway. When absent, auto-derived from
    /// the request's `Host` header during classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_host: Option<String>,

    /// DNS label separating an encoded target id from the gateway host.
    #[serde(default = "default_gateway_subdomain")]
    pub gateway_subdomain: String,

    /// Overrides the upstream scheme the parser derives, before `force_http`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_protocol: Option<String>,

    /// Downgrade `https`/`wss` to `http`/`ws` before forwarding.
    #[serde(default = "default_true")]
    pub force_http: bool,

    /// Reserved; influences websocket scheme selection. Currently unused
    /// (spec §9 Open Question: "declared but unused").
    #[serde(default = "default_true")]
    pub force_websocket_protocol: bool,

    /// Ports eligible for raw TCP tunneling (§4.7). Accepted here but not
    /// wired into the default middleware dispatch (spec §9).
    #[serde(default)]
    pub socket_ports: Vec<u16>,

    /// Mirror `error` events to the `log` crate in addition to the event
    /// channel.
    #[serde(default = "default_true")]
    pub log_errors_to_console: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_host: None,
            gateway_subdomain: default_gateway_subdomain(),
            force_protocol: None,
            force_http: true,
            force_websocket_protocol: true,
            socket_ports: Vec::new(),
            log_errors_to_console: true,
        }
    }
}

/// Builder for [`GatewayConfig`], since the type itself has no public
/// setters once constructed.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn new() -> Self {
        Self { config: GatewayConfig::default() }
    }

    pub fn gateway_host(mut self, host: impl Into<String>) -> Self {
        self.config.gateway_host = Some(host.into());
        self
    }

    pub fn gateway_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.config.gateway_subdomain = subdomain.into();
        self
    }

    pub fn force_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.force_protocol = Some(protocol.into());
        self
    }

    pub fn force_http(mut self, force: bool) -> Self {
        self.config.force_http = force;
        self
    }

    pub fn force_websocket_protocol(mut self, force: bool) -> Self {
        self.config.force_websocket_protocol = force;
        self
    }

    pub fn socket_ports(mut self, ports: Vec<u16>) -> Self {
        self.config.socket_ports = ports;
        self
    }

    pub fn log_errors_to_console(mut self, enabled: bool) -> Self {
        self.config.log_errors_to_console = enabled;
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}

impl GatewayConfig {
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// `"<subdomain>.<gateway_host>"` for an already-known gateway host.
    pub fn domain_postfix_for(&self, gateway_host: &str) -> String {
        format!("{}.{}", self.gateway_subdomain, gateway_host)
    }
}
