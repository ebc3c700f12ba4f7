// src/server/frontend.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::load_balancer::BackendPool;
use crate::metrics::MetricsCollector;
use crate::proxy::{Forwarder, Proxy};
use crate::server::{listener::Accept, RequestHandler, ServerBuilder};

/// A listening address bound to exactly one backend pool.
pub struct Frontend {
    pub name: String,
    /// `host:port`; host names are resolved when binding.
    pub bind: String,
    /// Recorded from configuration; only round-robin exists.
    pub strategy: String,
    pub backends: Arc<dyn BackendPool>,
}

impl Frontend {
    pub fn proxy(
        &self,
        forwarder: Arc<dyn Forwarder>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Proxy {
        let proxy = Proxy::new(self.name.clone(), self.backends.clone(), forwarder);
        match metrics {
            Some(metrics) => proxy.with_metrics(metrics),
            None => proxy,
        }
    }

    /// Binds the frontend's address and serves until the listener fails.
    pub async fn start(
        self,
        forwarder: Arc<dyn Forwarder>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<()> {
        let proxy = self.launch(forwarder, metrics);
        ServerBuilder::new(self.bind)
            .with_handler(move |peer: SocketAddr| RequestHandler::new(proxy.clone(), peer))
            .serve()
            .await
    }

    /// Same as [`start`](Self::start) on an already bound listener.
    pub async fn start_on<A: Accept>(
        self,
        listener: A,
        forwarder: Arc<dyn Forwarder>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<()> {
        let proxy = self.launch(forwarder, metrics);
        ServerBuilder::new(self.bind)
            .with_handler(move |peer: SocketAddr| RequestHandler::new(proxy.clone(), peer))
            .serve_on(listener)
            .await
    }

    fn launch(
        &self,
        forwarder: Arc<dyn Forwarder>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Arc<Proxy> {
        tracing::info!(
            frontend = %self.name,
            backends = self.backends.len(),
            "listening on {}, balancing",
            self.bind
        );
        Arc::new(self.proxy(forwarder, metrics))
    }
}
