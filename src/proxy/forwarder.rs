// ────────────────────────────────
// src/proxy/forwarder.rs
// The HTTP forwarding engine: byte-level proxying of an already-rewritten request
// ────────────────────────────────

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::{self, HeaderMap, HeaderName};
use hyper::{Body, Client, Request, Response};
use tower::BoxError;

#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Sends `req` to the host in its URI and returns the upstream response.
    async fn forward(&self, req: Request<Body>) -> Result<Response<Body>, BoxError>;
}

const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Drops headers that describe a single transport hop, including any listed
/// in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Forwarding over plain HTTP with hyper's pooled client.
///
/// Upstream failures (refused connection, reset, malformed response) are
/// returned as errors and no response is synthesized. The request handler
/// logs them and hyper closes the client connection, so the client sees a
/// dropped connection rather than a `502 Bad Gateway`.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new() -> Self {
        Self {
            client: Client::builder().build_http(),
        }
    }
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, mut req: Request<Body>) -> Result<Response<Body>, BoxError> {
        strip_hop_by_hop(req.headers_mut());

        let mut response = self.client.request(req).await?;
        strip_hop_by_hop(response.headers_mut());
        Ok(response)
    }
}
