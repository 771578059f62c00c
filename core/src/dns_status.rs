//! Maps name-resolution / connection failures to an HTTP status code.

use std::fmt;

/// A recognized upstream resolve/connect failure token.
///
/// Mirrors the handful of Node.js `dns`/`net` error codes the original
/// gateway mapped; `Other` covers anything unrecognized (including the
/// absence of a code at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsErrorCode {
    NotFound,
    Refused,
    Cancelled,
    ConnRefused,
    Other,
}

impl DnsErrorCode {
    /// Parse the textual error code token (`"NOTFOUND"`, `"ECONNREFUSED"`, ...).
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("NOTFOUND") => DnsErrorCode::NotFound,
            Some("REFUSED") => DnsErrorCode::Refused,
            Some("CANCELLED") => DnsErrorCode::Cancelled,
            Some("CONNREFUSED") | Some("ECONNREFUSED") => DnsErrorCode::ConnRefused,
            _ => DnsErrorCode::Other,
        }
    }

    /// Derive a token from a real `std::io::ErrorKind`, for callers that
    /// only have an OS-level error rather than a symbolic DNS code.
    pub fn from_io_error_kind(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => DnsErrorCode::NotFound,
            std::io::ErrorKind::ConnectionRefused => DnsErrorCode::ConnRefused,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => DnsErrorCode::Cancelled,
            _ => DnsErrorCode::Other,
        }
    }

    /// The original token, for the mirrored "original code" diagnostic field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsErrorCode::NotFound => "NOTFOUND",
            DnsErrorCode::Refused => "REFUSED",
            DnsErrorCode::Cancelled => "CANCELLED",
            DnsErrorCode::ConnRefused => "CONNREFUSED",
            DnsErrorCode::Other => "UNKNOWN",
        }
    }

    /// Map to the HTTP status the gateway should surface.
    pub fn http_status(&self) -> u16 {
        match self {
            DnsErrorCode::NotFound => 404,
            DnsErrorCode::Refused | DnsErrorCode::Cancelled | DnsErrorCode::ConnRefused => 403,
            DnsErrorCode::Other => 500,
        }
    }
}

impl fmt::Display for DnsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totality_over_defined_tokens() {
        assert_eq!(DnsErrorCode::from_token(Some("NOTFOUND")).http_status(), 404);
        assert_eq!(DnsErrorCode::from_token(Some("REFUSED")).http_status(), 403);
        assert_eq!(DnsErrorCode::from_token(Some("CANCELLED")).http_status(), 403);
        assert_eq!(DnsErrorCode::from_token(Some("CONNREFUSED")).http_status(), 403);
    }

    #[test]
    fn unknown_and_absent_tokens_map_to_500() {
        assert_eq!(DnsErrorCode::from_token(Some("SOMETHING_ELSE")).http_status(), 500);
        assert_eq!(DnsErrorCode::from_token(None).http_status(), 500);
    }

    #[test]
    fn io_error_kinds_map_sensibly() {
        assert_eq!(DnsErrorCode::from_io_error_kind(std::io::ErrorKind::NotFound).http_status(), 404);
        assert_eq!(DnsErrorCode::from_io_error_kind(std::io::ErrorKind::ConnectionRefused).http_status(), 403);
        assert_eq!(DnsErrorCode::from_io_error_kind(std::io::ErrorKind::Other).http_status(), 500);
    }
}
