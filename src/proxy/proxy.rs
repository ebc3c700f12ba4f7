// ────────────────────────────────
// src/proxy/proxy.rs
// Dispatch: pick a backend, rewrite the request for it, hand it to the forwarder
// ────────────────────────────────

use hyper::header::{HeaderName, HeaderValue, InvalidHeaderValue};
use hyper::http::uri::{PathAndQuery, Scheme};
use hyper::{Body, Request, Response, StatusCode, Uri};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::BoxError;
use tracing::{debug, info};

use super::backend::Backend;
use super::forwarder::Forwarder;
use crate::load_balancer::BackendPool;
use crate::metrics::{MetricsCollector, Outcome, Timer};

/// Header carrying the bare IP of the client that reached the frontend.
pub const X_REAL_IP: &str = "x-real-ip";

/// Result of the routing step for one request.
#[derive(Debug)]
pub enum Route {
    /// A backend was chosen and `request` already targets it.
    Forward {
        backend: Arc<Backend>,
        request: Request<Body>,
    },
    /// The pool was empty. Nothing has been sent upstream.
    NoBackend,
}

pub struct Proxy {
    frontend: String,
    pool: Arc<dyn BackendPool>,
    forwarder: Arc<dyn Forwarder>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Proxy {
    pub fn new(
        frontend: impl Into<String>,
        pool: Arc<dyn BackendPool>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            frontend: frontend.into(),
            pool,
            forwarder,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn frontend(&self) -> &str {
        &self.frontend
    }

    pub fn pool(&self) -> &Arc<dyn BackendPool> {
        &self.pool
    }

    /// Chooses a backend and rewrites `req` to target it.
    ///
    /// The pool lock is released before this returns, so it is never held
    /// while the request is in flight.
    pub fn route(&self, mut req: Request<Body>, client: SocketAddr) -> Result<Route, ProxyError> {
        let Some(backend) = self.pool.choose() else {
            info!("no backend for client {}", client);
            return Ok(Route::NoBackend);
        };
        debug!("serving to backend {}", backend.name());

        *req.uri_mut() = upstream_uri(req.uri(), backend.address())?;
        let real_ip = HeaderValue::from_str(&client.ip().to_string())?;
        req.headers_mut()
            .append(HeaderName::from_static(X_REAL_IP), real_ip);

        Ok(Route::Forward {
            backend,
            request: req,
        })
    }

    /// Full request path: route, then forward or reject.
    ///
    /// An empty pool yields a 503 with no body. A forwarding failure is
    /// returned as an error and never retried against another backend.
    pub async fn handle(
        &self,
        req: Request<Body>,
        client: SocketAddr,
    ) -> Result<Response<Body>, ProxyError> {
        let timer = Timer::new();

        let (backend, request) = match self.route(req, client) {
            Ok(Route::Forward { backend, request }) => (backend, request),
            Ok(Route::NoBackend) => {
                self.record(Outcome::Rejected, &timer);
                return Ok(service_unavailable());
            }
            Err(err) => {
                self.record(Outcome::Failed, &timer);
                return Err(err);
            }
        };

        let result = self.forwarder.forward(request).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_backend_request(&self.frontend, backend.name(), result.is_ok());
        }

        match result {
            Ok(response) => {
                self.record(Outcome::Completed, &timer);
                Ok(response)
            }
            Err(source) => {
                self.record(Outcome::Failed, &timer);
                Err(ProxyError::Forward {
                    backend: backend.name().to_string(),
                    source,
                })
            }
        }
    }

    fn record(&self, outcome: Outcome, timer: &Timer) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(&self.frontend, outcome, timer.elapsed());
        }
    }
}

fn upstream_uri(original: &Uri, address: &str) -> Result<Uri, ProxyError> {
    let path_and_query = original
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(address)
        .path_and_query(path_and_query)
        .build()
        .map_err(|source| ProxyError::InvalidTarget {
            address: address.to_string(),
            source,
        })
}

fn service_unavailable() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response
}

/// Faults during dispatch. An empty pool is not one of them; see [`Route::NoBackend`].
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream address {address:?}: {source}")]
    InvalidTarget {
        address: String,
        #[source]
        source: hyper::http::Error,
    },

    #[error("invalid client address header: {0}")]
    InvalidClientIp(#[from] InvalidHeaderValue),

    #[error("forwarding to backend {backend} failed: {source}")]
    Forward {
        backend: String,
        #[source]
        source: BoxError,
    },
}
