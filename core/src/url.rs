//! A small, mutable absolute-URL type standing in for spec.md's `URL`.
//!
//! `hyper::Uri` is immutable and awkward to rebuild piecemeal (protocol
//! downgrade, path stripping), so `backend_url` is modeled as this plain
//! struct instead, with a `TryFrom<&str>` / `Display` pair for conversion
//! at the edges where a real `hyper::Uri` is required (building the
//! upstream request).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl {
    pub protocol: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
}

impl BackendUrl {
    /// Parse `scheme://host[:port][/path][?query]`. `scheme` defaults to
    /// `http` if absent (spec §4.3's route parser treats the remainder of
    /// the path as `scheme://<remainder>`, so a bare `host:port/path` must
    /// still parse).
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (protocol, rest) = match raw.split_once("://") {
            Some((scheme, rest)) => (scheme.to_string(), rest),
            None => ("http".to_string(), raw),
        };
        let (authority, path_and_query) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(format!("missing host in URL: {raw}"));
        }
        let (host, port) = split_authority(authority)?;
        let (path, query) = match path_and_query.find('?') {
            Some(idx) => (path_and_query[..idx].to_string(), Some(path_and_query[idx + 1..].to_string())),
            None => (if path_and_query.is_empty() { "/".to_string() } else { path_and_query.to_string() }, None),
        };
        Ok(BackendUrl { protocol, host, port, path, query })
    }

    /// Strip a trailing `/.websocket` path segment, per spec §3/§4.4 step 5.
    pub fn strip_trailing_websocket_segment(&mut self) {
        if let Some(stripped) = self.path.strip_suffix("/.websocket") {
            self.path = if stripped.is_empty() { "/".to_string() } else { stripped.to_string() };
        }
    }

    /// Downgrade `https`→`http` and `wss`→`ws`, per spec §3 / §8 "Force-HTTP".
    pub fn downgrade_to_plain(&mut self) {
        self.protocol = match self.protocol.as_str() {
            "https" => "http".to_string(),
            "wss" => "ws".to_string(),
            other => other.to_string(),
        };
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.clone(),
        }
    }

    pub fn default_port(&self) -> u16 {
        match self.protocol.as_str() {
            "https" | "wss" => 443,
            _ => 80,
        }
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or_else(|| self.default_port())
    }

    pub fn authority(&self) -> String {
        match self.port {
            Some(p) => format!("{}:{}", self.host, p),
            None => self.host.clone(),
        }
    }
}

impl fmt::Display for BackendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.protocol, self.authority(), self.path_and_query())
    }
}

fn split_authority(authority: &str) -> Result<(String, Option<u16>), String> {
    // IPv6 literals (`[::1]:8080`) keep their brackets in `host`.
    if let Some(rest) = authority.strip_prefix('[') {
        let end = rest.find(']').ok_or_else(|| format!("unterminated IPv6 literal: {authority}"))?;
        let host = format!("[{}]", &rest[..end]);
        let after = &rest[end + 1..];
        let port = match after.strip_prefix(':') {
            Some(p) => Some(p.parse::<u16>().map_err(|e| e.to_string())?),
            None => None,
        };
        return Ok((host, port));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) && !port.is_empty() => {
            Ok((host.to_string(), Some(port.parse::<u16>().map_err(|e| e.to_string())?)))
        }
        _ => Ok((authority.to_string(), None)),
    }
}
