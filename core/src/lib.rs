//! `gateway-core`: request-interception middleware for a reverse
//! HTTP/WebSocket gateway. Transport-agnostic — the `hyper` types it deals
//! in are handed to it by a host HTTP server, which also owns the routing
//! prefix and the final disposition of a pass-through request.
//!
//! See `Gateway` for the single entry point a host framework needs.

pub mod classifier;
pub mod config;
pub mod dns_status;
pub mod error;
pub mod events;
pub mod hostname;
pub mod http_proxy;
pub mod middleware;
pub mod parser;
pub mod tcp_tunnel;
pub mod url;
pub mod ws_tunnel;

pub use classifier::RequestInfo;
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::GatewayError;
pub use events::{ErrorEvent, GatewayEvents, LogEvent};
pub use middleware::{Filter, FilterOutcome, Gateway, GatewayOutcome};
pub use parser::{route_parser, BackendParser, DefaultBackendParser, RequestContext};
pub use url::BackendUrl;
