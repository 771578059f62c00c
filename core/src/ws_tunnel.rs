//! WebSocket Tunnel Engine (spec §4.6): performs the upgrade handshake
//! through the upstream and splices the two raw sockets once both sides
//! have switched protocols.
//!
//! Grounded directly in the teacher's `proxy_websocket`: build the
//! handshake request with an empty body (the original request is kept
//! alive, untouched, so its `OnUpgrade` extension survives for later),
//! await the upstream response, and on `101` drive
//! `tokio::io::copy_bidirectional` over both upgraded connections — the
//! same duplex-copy primitive the teacher already reaches for, which
//! spec §9's design note on splicing explicitly recommends.

use crate::error::GatewayError;
use crate::events::GatewayEvents;
use crate::http_proxy::build_upstream_request;
use crate::url::BackendUrl;
use bytes::Bytes;
use hyper::client::HttpConnector;
use hyper::upgrade::Upgraded;
use hyper::{Body, Client, Request, Response, StatusCode, Version};
use hyper_tls::HttpsConnector;
use log::Level;
use socket2::SockRef;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;

/// Drive the upstream WebSocket handshake for an already-classified,
/// websocket-flagged request. On success returns the `101` response to
/// write to the client and has already spawned the background splice
/// task; on a non-upgrade upstream response returns a response carrying
/// the `denied` body described in spec §4.6 step 3 / §7.4.
pub async fn proxy_websocket(client_req: Request<Body>, backend_url: &BackendUrl, events: &GatewayEvents) -> Result<Response<Body>, GatewayError> {
    let handshake_req = build_handshake_request(&client_req, backend_url)?;

    let upstream_result = if backend_url.http_equivalent_scheme() == "https" {
        let client: Client<_, Body> = Client::builder().build(HttpsConnector::new());
        client.request(handshake_req).await
    } else {
        let client: Client<HttpConnector, Body> = Client::new();
        client.request(handshake_req).await
    };

    let mut upstream_res = upstream_result.map_err(|e| GatewayError::upstream_connect(std::io::ErrorKind::ConnectionRefused, e.to_string()))?;

    if upstream_res.status() != StatusCode::SWITCHING_PROTOCOLS {
        events.log(Level::Warn, format!("upstream denied websocket upgrade with status {}", upstream_res.status()));
        let status = upstream_res.status();
        return Response::builder()
            .status(status)
            .header(hyper::header::CONTENT_TYPE, "text/plain")
            .body(Body::from("denied"))
            .map_err(|e| GatewayError::UpstreamTransport(e.to_string()));
    }

    // Build the synthesized 101 response to the client before upstream_res
    // is consumed by `upgrade::on` below: spec §5 requires the status line
    // and headers to be flushed strictly before any payload byte.
    let mut client_response = Response::builder().status(StatusCode::SWITCHING_PROTOCOLS);
    for (name, value) in upstream_res.headers().iter() {
        client_response = client_response.header(name, value.clone());
    }
    let client_response = client_response.body(Body::empty()).map_err(|e| GatewayError::UpstreamTransport(e.to_string()))?;

    let events = events.clone();
    tokio::spawn(async move {
        let client_upgrade = hyper::upgrade::on(client_req).await;
        let upstream_upgrade = hyper::upgrade::on(&mut upstream_res).await;
        match (client_upgrade, upstream_upgrade) {
            (Ok(client_io), Ok(upstream_io)) => {
                let mut client_io = TunnelIo::from_upgraded(client_io);
                let mut upstream_io = TunnelIo::from_upgraded(upstream_io);
                if let Err(e) = tokio::io::copy_bidirectional(&mut client_io, &mut upstream_io).await {
                    events.error(format!("websocket tunnel IO error: {e}"));
                }
            }
            (Err(e), _) => events.error(format!("client upgrade failed: {e}")),
            (_, Err(e)) => events.error(format!("upstream upgrade failed: {e}")),
        }
    });

    Ok(client_response)
}

/// Build the upstream handshake request, reusing §4.5's Host-rewrite
/// builder but with an empty body (the handshake never has one) and the
/// original request's own headers/method/uri (borrowed, not consumed, so
/// `client_req` remains intact for the later `upgrade::on` call).
fn build_handshake_request(client_req: &Request<Body>, backend_url: &BackendUrl) -> Result<Request<Body>, GatewayError> {
    let placeholder = Request::builder()
        .method(client_req.method().clone())
        .uri(client_req.uri().clone())
        .version(Version::HTTP_11)
        .body(Body::empty())
        .map_err(|e| GatewayError::Classification(e.to_string()))?;
    let (mut parts, body) = placeholder.into_parts();
    parts.headers = client_req.headers().clone();
    let placeholder = Request::from_parts(parts, body);
    build_upstream_request(placeholder, backend_url)
}

/// Either a tuned raw `TcpStream` (with any bytes hyper already buffered
/// while parsing the handshake re-queued in front, per spec §4.6 step 4's
/// `proxy_head` requirement) or the plain upgraded connection, for
/// transports hyper didn't hand us a downcastable socket for.
enum TunnelIo {
    Tcp { leading: Bytes, leading_pos: usize, stream: TcpStream },
    Opaque(Upgraded),
}

impl TunnelIo {
    fn from_upgraded(upgraded: Upgraded) -> Self {
        match upgraded.downcast::<TcpStream>() {
            Ok(parts) => {
                let _ = parts.io.set_nodelay(true);
                let sock = SockRef::from(&parts.io);
                let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(0));
                let _ = sock.set_tcp_keepalive(&keepalive);
                TunnelIo::Tcp { leading: parts.read_buf, leading_pos: 0, stream: parts.io }
            }
            Err(original) => TunnelIo::Opaque(original),
        }
    }
}

impl AsyncRead for TunnelIo {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TunnelIo::Tcp { leading, leading_pos, stream } => {
                if *leading_pos < leading.len() {
                    let remaining = &leading[*leading_pos..];
                    let n = remaining.len().min(buf.remaining());
                    buf.put_slice(&remaining[..n]);
                    *leading_pos += n;
                    return Poll::Ready(Ok(()));
                }
                Pin::new(stream).poll_read(cx, buf)
            }
            TunnelIo::Opaque(upgraded) => Pin::new(upgraded).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TunnelIo {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            TunnelIo::Tcp { stream, .. } => Pin::new(stream).poll_write(cx, buf),
            TunnelIo::Opaque(upgraded) => Pin::new(upgraded).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TunnelIo::Tcp { stream, .. } => Pin::new(stream).poll_flush(cx),
            TunnelIo::Opaque(upgraded) => Pin::new(upgraded).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            TunnelIo::Tcp { stream, .. } => Pin::new(stream).poll_shutdown(cx),
            TunnelIo::Opaque(upgraded) => Pin::new(upgraded).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{CONNECTION, UPGRADE};

    #[test]
    fn handshake_request_forces_http11_and_keeps_upgrade_headers() {
        let req = Request::builder()
            .method("GET")
            .uri("/backend/ws")
            .header(UPGRADE, "websocket")
            .header(CONNECTION, "Upgrade")
            .body(Body::empty())
            .unwrap();
        let backend = BackendUrl::parse("http://localhost:3030/ws").unwrap();
        let upstream = build_handshake_request(&req, &backend).unwrap();
        assert_eq!(upstream.version(), Version::HTTP_11);
        assert_eq!(upstream.headers().get(UPGRADE).unwrap(), "websocket");
        assert_eq!(upstream.uri().to_string(), "http://localhost:3030/ws");
    }
}
