//! HTTP Proxy Engine (spec §4.5): builds the upstream request from a
//! classified [`RequestInfo`], streams the client body upstream and the
//! upstream response back to the client.
//!
//! Built directly on `hyper::Client` rather than the teacher's
//! `hyper_reverse_proxy` crate (see `DESIGN.md`), the same way the
//! teacher's own `proxy_websocket` builds its upstream handshake request
//! by hand for the control it needs over headers.

use crate::error::GatewayError;
use crate::url::BackendUrl;
use hyper::client::HttpConnector;
use hyper::{header, Body, Client, Request, Response, Version};
use hyper_tls::HttpsConnector;
use std::error::Error as StdError;

/// Build the upstream request for `backend_url`, applying the Host-header
/// rewrite rule from spec §4.5/§8: a client `Host` header whose value ends
/// in the backend's host is cleared (preventing a self-redirect loop when
/// gateway and backend share a DNS suffix); otherwise it is forwarded
/// byte-for-byte.
pub fn build_upstream_request(client_req: Request<Body>, backend_url: &BackendUrl) -> Result<Request<Body>, GatewayError> {
    let upstream_uri = format!("{}://{}{}", backend_url.http_equivalent_scheme(), backend_url.authority(), backend_url.path_and_query())
        .parse()
        .map_err(|e| GatewayError::Classification(format!("invalid upstream URI: {e}")))?;

    let (parts, body) = client_req.into_parts();
    let mut builder = Request::builder().method(parts.method).uri(upstream_uri).version(Version::HTTP_11);

    for (name, value) in parts.headers.iter() {
        if name == header::HOST {
            if let Ok(host_value) = value.to_str() {
                if host_value.ends_with(backend_url.host.as_str()) {
                    continue;
                }
            }
        }
        builder = builder.header(name, value);
    }

    builder.body(body).map_err(|e| GatewayError::Classification(format!("failed to build upstream request: {e}")))
}

/// Stream the client's request to `backend_url` and relay the upstream
/// response (status, headers, body) back verbatim.
pub async fn proxy_http(client_req: Request<Body>, backend_url: &BackendUrl) -> Result<Response<Body>, GatewayError> {
    let upstream_req = build_upstream_request(client_req, backend_url)?;

    let result = if backend_url.http_equivalent_scheme() == "https" {
        let client: Client<_, Body> = Client::builder().build(HttpsConnector::new());
        client.request(upstream_req).await
    } else {
        let client: Client<HttpConnector, Body> = Client::new();
        client.request(upstream_req).await
    };

    result.map_err(map_hyper_error)
}

fn map_hyper_error(err: hyper::Error) -> GatewayError {
    let io_kind = err.source().and_then(|src| src.downcast_ref::<std::io::Error>()).map(|io| io.kind());
    match io_kind {
        Some(kind) => GatewayError::upstream_connect(kind, err.to_string()),
        None if err.is_connect() => GatewayError::upstream_connect(std::io::ErrorKind::ConnectionRefused, err.to_string()),
        None => GatewayError::UpstreamTransport(err.to_string()),
    }
}

impl BackendUrl {
    /// The scheme an HTTP client understands: `ws`/`wss` map to their
    /// plain-HTTP equivalents for the purpose of picking a connector.
    pub fn http_equivalent_scheme(&self) -> &'static str {
        match self.protocol.as_str() {
            "https" | "wss" => "https",
            _ => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HOST;

    #[test]
    fn clears_host_header_when_it_ends_with_backend_host() {
        let backend = BackendUrl::parse("http://localhost:3030/foo").unwrap();
        let req = Request::builder().method("GET").uri("/foo").header(HOST, "localhost").body(Body::empty()).unwrap();
        let upstream = build_upstream_request(req, &backend).unwrap();
        assert!(upstream.headers().get(HOST).is_none());
    }

    #[test]
    fn preserves_host_header_when_it_does_not_match_backend() {
        let backend = BackendUrl::parse("http://localhost:3030/foo").unwrap();
        let req = Request::builder().method("GET").uri("/foo").header(HOST, "gateway.example.com").body(Body::empty()).unwrap();
        let upstream = build_upstream_request(req, &backend).unwrap();
        assert_eq!(upstream.headers().get(HOST).unwrap(), "gateway.example.com");
    }

    #[test]
    fn upstream_uri_uses_backend_host_and_path() {
        let backend = BackendUrl::parse("http://localhost:3030/foo?bar=1").unwrap();
        let req = Request::builder().method("GET").uri("/foo?bar=1").body(Body::empty()).unwrap();
        let upstream = build_upstream_request(req, &backend).unwrap();
        assert_eq!(upstream.uri().to_string(), "http://localhost:3030/foo?bar=1");
    }

    #[test]
    fn wss_backend_maps_to_https_transport() {
        let backend = BackendUrl::parse("wss://localhost:3030/ws").unwrap();
        assert_eq!(backend.http_equivalent_scheme(), "https");
    }
}
