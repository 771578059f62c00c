//! The two-phase request classifier (spec §4.4): populates a
//! [`RequestInfo`] scratch record and decides whether the gateway should
//! intercept a request at all.

use crate::config::GatewayConfig;
use crate::hostname;
use crate::parser::{BackendParser, RequestContext};
use crate::url::BackendUrl;
use hyper::Method;

/// Per-request scratch record, owned by the orchestrator and discarded on
/// completion (spec §3).
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub is_gateway_intercept: bool,
    pub is_gateway_host: bool,
    pub is_websocket_request: bool,
    pub target_id: Option<String>,
    pub gateway_domain_postfix: String,
    pub target_method: Option<Method>,
    pub backend_url: Option<BackendUrl>,
}

impl RequestInfo {
    /// Phase 1 (spec §4.4): always runs, before any user filter. Derives
    /// the gateway host/postfix, websocket detection, and — for requests
    /// already addressed to the encoded subdomain — the decoded target id
    /// and its resolved backend URL.
    pub fn classify_phase1(parser: &dyn BackendParser, ctx: &RequestContext, config: &GatewayConfig) -> Self {
        let host_header = ctx.host_header().unwrap_or("").to_string();

        let gateway_host = config.gateway_host.clone().unwrap_or_else(|| derive_gateway_host(&host_header, &config.gateway_subdomain));

        let gateway_domain_postfix = config.domain_postfix_for(&gateway_host);
        let is_gateway_host = host_header.ends_with(gateway_domain_postfix.as_str());
        let is_websocket_request = is_websocket(ctx);

        let mut info = RequestInfo {
            is_gateway_intercept: false,
            is_gateway_host,
            is_websocket_request,
            target_id: None,
            gateway_domain_postfix,
            target_method: None,
            backend_url: None,
        };

        if is_gateway_host {
            let label_with_sep = &host_header[..host_header.len() - info.gateway_domain_postfix.len()];
            let encoded_label = label_with_sep.strip_suffix('.').unwrap_or(label_with_sep);
            let target_id = hostname::decode(encoded_label);
            match parser.parse_url_from_id(ctx, &target_id) {
                Ok(backend_url) => info.backend_url = Some(backend_url),
                Err(_) => info.backend_url = None,
            }
            info.target_id = Some(target_id);
        }

        info
    }

    /// Phase 2 (spec §4.4): runs only if no filter vetoed or shortcut the
    /// request. Resolves route-mode backend URLs, decides the final
    /// intercept verdict, and strips the `/.websocket` path segment.
    pub fn classify_phase2(&mut self, parser: &dyn BackendParser, ctx: &RequestContext, config: &GatewayConfig) {
        self.is_gateway_intercept = true;

        if !self.is_gateway_host {
            self.backend_url = parser.parse_url_from_route(ctx);
        }

        let Some(mut backend_url) = self.backend_url.take() else {
            self.is_gateway_intercept = false;
            return;
        };

        if self.target_id.is_none() {
            // Mirrors the WHATWG `URL.host` property (host **and** port),
            // not `hostname` — spec's redirect example encodes `host:port`.
            self.target_id = Some(backend_url.authority());
        }
        self.target_method = Some(parser.parse_method(ctx));
        backend_url.protocol = parser.parse_protocol(ctx, config);

        if self.is_websocket_request {
            backend_url.strip_trailing_websocket_segment();
        }

        self.backend_url = Some(backend_url);
    }
}

fn derive_gateway_host(host_header: &str, gateway_subdomain: &str) -> String {
    let needle = format!(".{gateway_subdomain}.");
    match host_header.rfind(needle.as_str()) {
        Some(idx) => host_header[idx + needle.len()..].to_string(),
        None => host_header.to_string(),
    }
}

fn is_websocket(ctx: &RequestContext) -> bool {
    if ctx.headers.contains_key("sec-websocket-protocol") {
        return true;
    }
    ctx.headers.get(hyper::header::UPGRADE).and_then(|v| v.to_str().ok()).map(|v| v.eq_ignore_ascii_case("websocket")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{HeaderMap, Uri};

    struct DefaultParser;
    impl BackendParser for DefaultParser {}

    fn ctx(uri: &str, host: &str, headers: HeaderMap) -> RequestContext {
        let mut headers = headers;
        headers.insert(hyper::header::HOST, host.parse().unwrap());
        RequestContext { method: Method::GET, uri: uri.parse::<Uri>().unwrap(), headers, scheme: "http".to_string(), mount_prefix: "/backend".to_string() }
    }

    #[test]
    fn phase1_auto_derives_gateway_host_when_not_configured() {
        let config = GatewayConfig::default();
        let c = ctx("/x", "127.0.0.1.e058.3030.gateway-proxy.example.com", HeaderMap::new());
        let info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        assert!(info.is_gateway_host);
        assert_eq!(info.gateway_domain_postfix, "gateway-proxy.example.com");
        assert_eq!(info.target_id.as_deref(), Some("127.0.0.1:3030"));
        assert_eq!(info.backend_url.unwrap().to_string(), "http://127.0.0.1:3030/x");
    }

    #[test]
    fn phase1_is_deterministic_for_fixed_input() {
        let config = GatewayConfig::builder().gateway_host("example.com").build();
        let c = ctx("/x", "example.com", HeaderMap::new());
        let a = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        let b = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        assert_eq!(a.is_gateway_host, b.is_gateway_host);
        assert_eq!(a.gateway_domain_postfix, b.gateway_domain_postfix);
        assert_eq!(a.target_id, b.target_id);
    }

    #[test]
    fn phase1_detects_websocket_via_upgrade_header() {
        let config = GatewayConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(hyper::header::UPGRADE, "websocket".parse().unwrap());
        let c = ctx("/backend/ws", "example.com", headers);
        let info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        assert!(info.is_websocket_request);
    }

    #[test]
    fn phase2_route_mode_pass_through_when_parser_returns_none() {
        let config = GatewayConfig::default();
        let c = ctx("/other", "example.com", HeaderMap::new());
        let mut info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        info.classify_phase2(&DefaultParser, &c, &config);
        assert!(!info.is_gateway_intercept);
        assert!(info.backend_url.is_none());
    }

    #[test]
    fn phase2_route_mode_intercepts_and_sets_method() {
        let config = GatewayConfig::default();
        let c = ctx("/backend/localhost:3030/foo", "example.com", HeaderMap::new());
        let mut info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        info.classify_phase2(&DefaultParser, &c, &config);
        assert!(info.is_gateway_intercept);
        assert_eq!(info.target_method, Some(Method::GET));
        assert_eq!(info.backend_url.unwrap().to_string(), "http://localhost:3030/foo");
    }

    #[test]
    fn phase2_strips_trailing_websocket_segment() {
        let config = GatewayConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(hyper::header::UPGRADE, "websocket".parse().unwrap());
        let c = ctx("/backend/localhost:3030/ws/.websocket", "example.com", headers);
        let mut info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        info.classify_phase2(&DefaultParser, &c, &config);
        assert_eq!(info.backend_url.unwrap().path, "/ws");
    }

    #[test]
    fn force_http_downgrades_https_protocol_via_parser_default() {
        let config = GatewayConfig::builder().force_protocol("https").build();
        let c = ctx("/backend/localhost:3030/foo", "example.com", HeaderMap::new());
        let mut info = RequestInfo::classify_phase1(&DefaultParser, &c, &config);
        info.classify_phase2(&DefaultParser, &c, &config);
        assert_eq!(info.backend_url.unwrap().protocol, "http");
    }
}
