//! Typed gateway errors, carrying the mapped HTTP status alongside the
//! diagnostic fields spec'd for the framework error channel.

use crate::dns_status::DnsErrorCode;
use thiserror::Error;

/// Any error raised while classifying, proxying, or tunneling a request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request's host or the parser-produced URL could not be parsed.
    #[error("classification error: {0}")]
    Classification(String),

    /// Upstream DNS resolution or TCP/TLS connect failed.
    #[error("upstream connect error ({original_code}): {message}")]
    UpstreamConnect { original_code: DnsErrorCode, message: String },

    /// The upstream connection failed after the request was already in
    /// flight (mid-stream transport error).
    #[error("upstream transport error: {0}")]
    UpstreamTransport(String),

    /// The upstream refused to upgrade a WebSocket request.
    #[error("upstream denied websocket upgrade (status {status})")]
    UpgradeDenied { status: u16 },

    /// A user-supplied filter or parser callback panicked or returned an error.
    #[error("filter/parser error: {0}")]
    Filter(String),
}

impl GatewayError {
    /// The HTTP status code this error should be surfaced as.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Classification(_) => 500,
            GatewayError::UpstreamConnect { original_code, .. } => original_code.http_status(),
            GatewayError::UpstreamTransport(_) => 502,
            GatewayError::UpgradeDenied { status } => *status,
            GatewayError::Filter(_) => 500,
        }
    }

    /// The original diagnostic code, mirrored alongside the mapped status
    /// per spec §4.2 ("attached both as status code and as a mirrored
    /// 'original code' field").
    pub fn original_code(&self) -> &'static str {
        match self {
            GatewayError::UpstreamConnect { original_code, .. } => original_code.as_str(),
            _ => "UNKNOWN",
        }
    }

    pub fn upstream_connect(kind: std::io::ErrorKind, message: impl Into<String>) -> Self {
        GatewayError::UpstreamConnect { original_code: DnsErrorCode::from_io_error_kind(kind), message: message.into() }
    }
}
