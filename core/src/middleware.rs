//! Middleware Orchestrator (spec §4.8): the `ENTRY → CLASSIFIED → FILTERED →
//! {PASS | REDIRECT | PROXY | WEBSOCKET | ERROR}` state machine that
//! composes every other module.
//!
//! The "host HTTP server framework" spec §1 treats as an external
//! collaborator becomes [`Gateway::handle`]'s caller: any `hyper`
//! `service_fn` can await it directly. The filter tri-state (spec §9's
//! design note) is the [`FilterOutcome`] enum rather than the original's
//! sentinel-comparison trick.

use crate::classifier::RequestInfo;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::events::GatewayEvents;
use crate::hostname;
use crate::http_proxy;
use crate::parser::{BackendParser, RequestContext};
use crate::ws_tunnel;
use hyper::{Body, Request, Response, StatusCode};
use log::Level;
use std::panic::{self, AssertUnwindSafe};

/// The tri-state a user filter callback may return (spec §9 "Filter
/// return-value convention"): veto interception outright, answer the
/// request itself, or let classification proceed to Phase 2.
pub enum FilterOutcome {
    /// Strict-equal-false veto (spec §4.8): suppresses interception, →`PASS`.
    Veto,
    /// The filter answered the request itself (the "filter called `next`
    /// with an override" case) — its response is returned verbatim, →`PASS`.
    Consumed(Response<Body>),
    /// Neither of the above: proceed to Phase 2.
    Proceed,
}

/// A user-supplied filter callback, run between Phase 1 and Phase 2 of
/// classification (spec §4.4/§4.8). Filters only ever see a snapshot of
/// `info`/`req`; they cannot mutate the request the orchestrator forwards.
pub trait Filter: Send + Sync {
    fn check(&self, info: &RequestInfo, req: &Request<Body>) -> FilterOutcome;
}

impl<F> Filter for F
where
    F: Fn(&RequestInfo, &Request<Body>) -> FilterOutcome + Send + Sync,
{
    fn check(&self, info: &RequestInfo, req: &Request<Body>) -> FilterOutcome {
        self(info, req)
    }
}

/// What the host framework should do with a request the gateway did not
/// intercept: the Rust analogue of calling the framework's own `next()`.
pub enum GatewayOutcome {
    /// The gateway answered the request; write this response to the client.
    Response(Response<Body>),
    /// `PASS`: the gateway did not intercept. The request is handed back,
    /// untouched (classification never reads the body), for the host
    /// framework's own routing to continue.
    PassThrough(Request<Body>),
}

/// Composes the Hostname Codec, Backend Parser, Request Classifier, HTTP
/// Proxy Engine, and WebSocket Tunnel Engine behind the single `handle`
/// entry point described in spec §4.8.
pub struct Gateway {
    config: GatewayConfig,
    parser: Box<dyn BackendParser>,
    filter: Option<Box<dyn Filter>>,
    events: GatewayEvents,
}

impl Gateway {
    pub fn new(config: GatewayConfig, parser: impl BackendParser + 'static) -> Self {
        let events = GatewayEvents::new(config.log_errors_to_console);
        Self { config, parser: Box::new(parser), filter: None, events }
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn events(&self) -> &GatewayEvents {
        &self.events
    }

    /// Run the full state machine for one request. `scheme` is the frontend
    /// scheme the request arrived on (`"http"`/`"https"`); `mount_prefix` is
    /// the path prefix this middleware is mounted at — both are the host
    /// framework's responsibility to supply, per spec §1's "routing prefix"
    /// external-collaborator contract.
    pub async fn handle(&self, req: Request<Body>, scheme: &str, mount_prefix: &str) -> GatewayOutcome {
        let ctx = RequestContext {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
            scheme: scheme.to_string(),
            mount_prefix: mount_prefix.to_string(),
        };

        // ENTRY → CLASSIFIED
        let parser = self.parser.as_ref();
        let mut info = match panic::catch_unwind(AssertUnwindSafe(|| RequestInfo::classify_phase1(parser, &ctx, &self.config))) {
            Ok(info) => info,
            Err(_) => {
                let err = GatewayError::Filter("backend parser panicked during phase 1 classification".to_string());
                return GatewayOutcome::Response(self.error_response(&err));
            }
        };

        // CLASSIFIED → FILTERED
        if let Some(filter) = &self.filter {
            match panic::catch_unwind(AssertUnwindSafe(|| filter.check(&info, &req))) {
                Ok(FilterOutcome::Veto) => return GatewayOutcome::PassThrough(req),
                Ok(FilterOutcome::Consumed(resp)) => return GatewayOutcome::Response(resp),
                Ok(FilterOutcome::Proceed) => {}
                Err(_) => {
                    let err = GatewayError::Filter("filter panicked".to_string());
                    return GatewayOutcome::Response(self.error_response(&err));
                }
            }
        }

        if panic::catch_unwind(AssertUnwindSafe(|| info.classify_phase2(parser, &ctx, &self.config))).is_err() {
            let err = GatewayError::Filter("backend parser panicked during phase 2 classification".to_string());
            return GatewayOutcome::Response(self.error_response(&err));
        }

        // FILTERED → ?
        if !info.is_gateway_intercept {
            return GatewayOutcome::PassThrough(req);
        }

        let mut backend_url = match info.backend_url.clone() {
            Some(url) => url,
            // Invariant (spec §3): is_gateway_intercept implies backend_url
            // is set. Treated as a classification bug, not a client error.
            None => {
                let err = GatewayError::Classification("intercept decided with no backend_url".to_string());
                return GatewayOutcome::Response(self.error_response(&err));
            }
        };

        if self.config.force_http {
            backend_url.downgrade_to_plain();
        }

        if info.is_websocket_request {
            return match ws_tunnel::proxy_websocket(req, &backend_url, &self.events).await {
                Ok(resp) => GatewayOutcome::Response(resp),
                Err(e) => GatewayOutcome::Response(self.error_response(&e)),
            };
        }

        if !info.is_gateway_host {
            return GatewayOutcome::Response(self.redirect_response(&info, &ctx));
        }

        match http_proxy::proxy_http(req, &backend_url).await {
            Ok(resp) => GatewayOutcome::Response(resp),
            Err(e) => GatewayOutcome::Response(self.error_response(&e)),
        }
    }

    /// `REDIRECT` (spec §4.8/§6): 302 to the encoded-subdomain form of the
    /// resolved backend, virtual-host-isolating cookies/storage for the
    /// proxied origin.
    fn redirect_response(&self, info: &RequestInfo, ctx: &RequestContext) -> Response<Body> {
        let backend_url = info.backend_url.as_ref().expect("REDIRECT requires a resolved backend_url");
        let target_id = info.target_id.as_deref().unwrap_or_default();
        let location = format!("{}://{}.{}{}", ctx.scheme, hostname::encode(target_id), info.gateway_domain_postfix, backend_url.path_and_query());

        Response::builder()
            .status(StatusCode::FOUND)
            .header(hyper::header::LOCATION, location)
            .body(Body::empty())
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }

    /// `ERROR` (spec §4.8/§7): emit error + log events, respond with the
    /// error's mapped status.
    fn error_response(&self, err: &GatewayError) -> Response<Body> {
        self.events.log(Level::Error, err.to_string());
        self.events.error(err.to_string());

        Response::builder()
            .status(err.status_code())
            .header(hyper::header::CONTENT_TYPE, "text/plain")
            .body(Body::from(err.to_string()))
            .unwrap_or_else(|_| Response::new(Body::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::route_parser;
    use crate::url::BackendUrl;
    use hyper::Method;

    fn req(method: &str, uri: &str, host: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).header(hyper::header::HOST, host).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn pass_through_when_route_parser_returns_none() {
        let gateway = Gateway::new(GatewayConfig::default(), route_parser(|_ctx| None));
        let outcome = gateway.handle(req("GET", "/other", "example.com"), "http", "/backend").await;
        assert!(matches!(outcome, GatewayOutcome::PassThrough(_)));
    }

    #[tokio::test]
    async fn redirect_for_route_mode_non_websocket_request() {
        let config = GatewayConfig::builder().gateway_host("example.com").build();
        let parser = route_parser(|_ctx| Some(BackendUrl::parse("http://127.0.0.1:3030/x").unwrap()));
        let gateway = Gateway::new(config, parser);
        let outcome = gateway.handle(req("GET", "/backend/x", "example.com"), "http", "/backend").await;
        match outcome {
            GatewayOutcome::Response(resp) => {
                assert_eq!(resp.status(), StatusCode::FOUND);
                let location = resp.headers().get(hyper::header::LOCATION).unwrap().to_str().unwrap();
                assert_eq!(location, "http://127.0.0.1.e058.3030.gateway-proxy.example.com/x");
            }
            GatewayOutcome::PassThrough(_) => panic!("expected a redirect response"),
        }
    }

    #[tokio::test]
    async fn filter_veto_suppresses_interception() {
        let config = GatewayConfig::default();
        let parser = route_parser(|_ctx| Some(BackendUrl::parse("http://127.0.0.1:3030/x").unwrap()));
        let gateway = Gateway::new(config, parser).with_filter(|_info: &RequestInfo, _req: &Request<Body>| FilterOutcome::Veto);
        let outcome = gateway.handle(req("GET", "/backend/x", "example.com"), "http", "/backend").await;
        assert!(matches!(outcome, GatewayOutcome::PassThrough(_)));
    }

    #[tokio::test]
    async fn filter_consumed_returns_its_own_response() {
        let config = GatewayConfig::default();
        let parser = route_parser(|_ctx| Some(BackendUrl::parse("http://127.0.0.1:3030/x").unwrap()));
        let gateway = Gateway::new(config, parser).with_filter(|_info: &RequestInfo, _req: &Request<Body>| {
            FilterOutcome::Consumed(Response::builder().status(StatusCode::FORBIDDEN).body(Body::empty()).unwrap())
        });
        let outcome = gateway.handle(req("GET", "/backend/x", "example.com"), "http", "/backend").await;
        match outcome {
            GatewayOutcome::Response(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            GatewayOutcome::PassThrough(_) => panic!("expected the filter's own response"),
        }
    }

    #[tokio::test]
    async fn filter_panic_is_caught_and_turned_into_a_500() {
        let config = GatewayConfig::default();
        let parser = route_parser(|_ctx| Some(BackendUrl::parse("http://127.0.0.1:3030/x").unwrap()));
        let gateway = Gateway::new(config, parser).with_filter(|_info: &RequestInfo, _req: &Request<Body>| -> FilterOutcome { panic!("boom") });
        let outcome = gateway.handle(req("GET", "/backend/x", "example.com"), "http", "/backend").await;
        match outcome {
            GatewayOutcome::Response(resp) => assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR),
            GatewayOutcome::PassThrough(_) => panic!("a panicking filter must not propagate past handle()"),
        }
    }

    #[tokio::test]
    async fn route_parser_panic_is_caught_and_turned_into_a_500() {
        let config = GatewayConfig::default();
        let parser = route_parser(|_ctx| -> Option<BackendUrl> { panic!("boom") });
        let gateway = Gateway::new(config, parser);
        let outcome = gateway.handle(req("GET", "/backend/x", "example.com"), "http", "/backend").await;
        match outcome {
            GatewayOutcome::Response(resp) => assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR),
            GatewayOutcome::PassThrough(_) => panic!("a panicking parser must not propagate past handle()"),
        }
    }

    #[test]
    fn target_method_and_method_helper_share_the_request_method() {
        let ctx = RequestContext { method: Method::POST, uri: "/x".parse().unwrap(), headers: hyper::HeaderMap::new(), scheme: "http".to_string(), mount_prefix: "/backend".to_string() };
        struct DefaultParser;
        impl BackendParser for DefaultParser {}
        assert_eq!(DefaultParser.parse_method(&ctx), Method::POST);
    }
}
