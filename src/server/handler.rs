// src/server/handler.rs
use hyper::{Body, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::proxy::Proxy;

/// Per-connection tower service in front of a frontend's [`Proxy`].
#[derive(Clone)]
pub struct RequestHandler {
    proxy: Arc<Proxy>,
    peer: SocketAddr,
}

impl RequestHandler {
    pub fn new(proxy: Arc<Proxy>, peer: SocketAddr) -> Self {
        Self { proxy, peer }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let proxy = self.proxy.clone();
        let peer = self.peer;
        let span = tracing::info_span!(
            "request",
            frontend = %proxy.frontend(),
            client = %peer,
            request_id = %Uuid::new_v4(),
        );

        Box::pin(
            async move {
                // Errors go back to hyper, which drops the connection.
                proxy.handle(req, peer).await.map_err(|e| {
                    tracing::error!(error = %e, "proxy error");
                    Box::new(e) as Box<dyn std::error::Error + Send + Sync>
                })
            }
            .instrument(span),
        )
    }
}
