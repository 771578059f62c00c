//! Pluggable backend-resolution strategy (spec §4.3), modeled as a trait
//! with default methods rather than the original's duck-typed bundle of
//! four optional callbacks — Rust has no runtime duck typing, so "a bare
//! function argument is lifted into a parser" (spec §9) becomes an
//! explicit [`route_parser`] adapter instead of argument-shape detection.

use crate::config::GatewayConfig;
use crate::url::BackendUrl;
use hyper::{HeaderMap, Method, Uri};

/// Everything a [`BackendParser`] needs to know about the inbound request,
/// independent of the host HTTP framework's own request type.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// The frontend scheme the request arrived on (`"http"` or `"https"`).
    pub scheme: String,
    /// The path prefix this middleware is mounted at (e.g. `"/backend"`),
    /// stripped by the default route parser before interpreting the rest
    /// of the path as `scheme://host[:port]/path`.
    pub mount_prefix: String,
}

impl RequestContext {
    pub fn path_and_query(&self) -> String {
        self.uri.path_and_query().map(|pq| pq.as_str().to_string()).unwrap_or_else(|| "/".to_string())
    }

    pub fn host_header(&self) -> Option<&str> {
        self.headers.get(hyper::header::HOST).and_then(|v| v.to_str().ok())
    }
}

/// Strategy deriving a backend URL, protocol, and method from a request.
///
/// All four operations have spec-defined defaults; a concrete deployment
/// typically overrides only [`BackendParser::parse_url_from_route`].
pub trait BackendParser: Send + Sync {
    /// Resolve the backend URL when the request arrived in host mode
    /// (the target id was decoded from the gateway subdomain label).
    fn parse_url_from_id(&self, ctx: &RequestContext, target_id: &str) -> Result<BackendUrl, String> {
        let candidate = format!("{}://{}{}", ctx.scheme, target_id, ctx.path_and_query());
        BackendUrl::parse(&candidate)
    }

    /// Resolve the backend URL when the request arrived in route mode.
    /// Returning `None` signals "do not intercept" (pass-through).
    fn parse_url_from_route(&self, ctx: &RequestContext) -> Option<BackendUrl> {
        let path_and_query = ctx.path_and_query();
        let remainder = path_and_query.strip_prefix(ctx.mount_prefix.as_str())?;
        let remainder = remainder.trim_start_matches('/');
        if remainder.is_empty() {
            return None;
        }
        let candidate = format!("{}://{}", ctx.scheme, remainder);
        BackendUrl::parse(&candidate).ok()
    }

    /// Resolve the upstream protocol: the request's own scheme, overridden
    /// by `force_protocol` if set, then downgraded `https`→`http` /
    /// `wss`→`ws` if `force_http` is set.
    fn parse_protocol(&self, ctx: &RequestContext, config: &GatewayConfig) -> String {
        let protocol = config.force_protocol.clone().unwrap_or_else(|| ctx.scheme.clone());
        if config.force_http {
            match protocol.as_str() {
                "https" => "http".to_string(),
                "wss" => "ws".to_string(),
                _ => protocol,
            }
        } else {
            protocol
        }
    }

    /// Resolve the HTTP method to use upstream.
    fn parse_method(&self, ctx: &RequestContext) -> Method {
        ctx.method.clone()
    }
}

/// A parser that uses every default operation unchanged — the common case
/// spec §4.3 calls out: "a concrete deployment typically supplies only
/// `parse_url_from_route`", and some deployments (a generic standalone
/// gateway daemon) don't even override that.
pub struct DefaultBackendParser;

impl BackendParser for DefaultBackendParser {}

/// Adapts a bare route-resolution closure into a [`BackendParser`] whose
/// other three operations fall back to the trait defaults — the Rust
/// equivalent of spec §9's "lift a bare function into a parser".
pub struct FnParser<F> {
    route_fn: F,
}

impl<F> BackendParser for FnParser<F>
where
    F: Fn(&RequestContext) -> Option<BackendUrl> + Send + Sync,
{
    fn parse_url_from_route(&self, ctx: &RequestContext) -> Option<BackendUrl> {
        (self.route_fn)(ctx)
    }
}

/// Build a [`BackendParser`] from a bare `Fn(&RequestContext) -> Option<BackendUrl>`.
pub fn route_parser<F>(route_fn: F) -> FnParser<F>
where
    F: Fn(&RequestContext) -> Option<BackendUrl> + Send + Sync,
{
    FnParser { route_fn }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(path: &str, scheme: &str, mount: &str) -> RequestContext {
        RequestContext {
            method: Method::GET,
            uri: path.parse().unwrap(),
            headers: HeaderMap::new(),
            scheme: scheme.to_string(),
            mount_prefix: mount.to_string(),
        }
    }

    struct DefaultParser;
    impl BackendParser for DefaultParser {}

    #[test]
    fn default_route_parser_strips_mount_prefix_and_parses_host_port() {
        let p = DefaultParser;
        let c = ctx("/backend/localhost:3030/foo", "http", "/backend");
        let url = p.parse_url_from_route(&c).unwrap();
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, Some(3030));
        assert_eq!(url.path, "/foo");
    }

    #[test]
    fn default_route_parser_returns_none_outside_mount_prefix() {
        let p = DefaultParser;
        let c = ctx("/other", "http", "/backend");
        assert!(p.parse_url_from_route(&c).is_none());
    }

    #[test]
    fn fn_parser_overrides_only_route_resolution() {
        let parser = route_parser(|ctx: &RequestContext| {
            if ctx.path_and_query().starts_with("/backend") {
                Some(BackendUrl::parse("http://localhost:3030/foo").unwrap())
            } else {
                None
            }
        });
        let c = ctx("/backend/foo", "http", "/backend");
        let url = parser.parse_url_from_route(&c).unwrap();
        assert_eq!(url.to_string(), "http://localhost:3030/foo");
        // other three operations still use trait defaults
        assert_eq!(parser.parse_method(&c), Method::GET);
    }

    #[test]
    fn parse_url_from_id_uses_target_id_as_host() {
        let p = DefaultParser;
        let c = ctx("/x", "http", "/backend");
        let url = p.parse_url_from_id(&c, "127.0.0.1:3030").unwrap();
        assert_eq!(url.to_string(), "http://127.0.0.1:3030/x");
    }
}
