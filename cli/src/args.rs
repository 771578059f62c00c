//! Command-line arguments, in the shape of the teacher's own
//! `command_line_arguments.rs` / `cli/arguments.rs`: a flat `clap`-derived
//! struct, no subcommands (this daemon has no route CRUD to manage).

use clap::Parser;
use gateway_core::GatewayConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "gatewayd", about, author, version, long_about = None)]
pub struct GatewaydArgs {
    #[arg(short = 'c', long = "config", help = "Path to the configuration file", default_value = "./gateway.json")]
    pub config_path: PathBuf,

    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short = 'w', long = "watch", help = "Watch the configuration file for changes")]
    pub watch: bool,

    #[arg(long = "addr", help = "Address to bind the gateway server on", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    #[arg(long = "mount-prefix", help = "Path prefix the gateway intercepts route-mode requests under", default_value = "/backend")]
    pub mount_prefix: String,

    #[arg(long = "gateway-host", help = "Override the gateway's externally visible host")]
    pub gateway_host: Option<String>,

    #[arg(long = "gateway-subdomain", help = "Override the DNS label separating an encoded target id from the gateway host")]
    pub gateway_subdomain: Option<String>,

    #[arg(long = "force-http", help = "Downgrade https/wss upstreams to http/ws", default_value = "true")]
    pub force_http: bool,
}

impl GatewaydArgs {
    /// Layer CLI overrides on top of a loaded [`GatewayConfig`]. Config
    /// fields are public (spec §3: immutable only in the sense of "no
    /// interior mutability", not "no direct field access"), so overriding
    /// is a plain assignment rather than a rebuild through the builder.
    pub fn apply_overrides(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.gateway_host {
            config.gateway_host = Some(host.clone());
        }
        if let Some(subdomain) = &self.gateway_subdomain {
            config.gateway_subdomain = subdomain.clone();
        }
        config.force_http = self.force_http;
    }
}
