// src/metrics/collector.rs
use anyhow::{Context, Result};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Prometheus text exposition of everything registered.
    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        Ok(buffer)
    }
}

/// How a single inbound request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Forwarded and answered by a backend.
    Completed,
    /// Pool was empty; answered with 503.
    Rejected,
    /// The forwarding engine failed after a backend was chosen.
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
        }
    }
}

pub struct MetricsCollector {
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,
    pub backend_requests_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("dub_requests_total", "Total number of inbound requests"),
            &["frontend", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dub_request_duration_seconds",
                "Request duration in seconds",
            ),
            &["frontend", "outcome"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let backend_requests_total = IntCounterVec::new(
            Opts::new("dub_backend_requests_total", "Total requests forwarded per backend"),
            &["frontend", "backend", "status"],
        )?;
        registry.register(Box::new(backend_requests_total.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            backend_requests_total,
        })
    }

    pub fn record_request(&self, frontend: &str, outcome: Outcome, duration: Duration) {
        let outcome = outcome.as_str();
        self.requests_total
            .with_label_values(&[frontend, outcome])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[frontend, outcome])
            .observe(duration.as_secs_f64());
    }

    pub fn record_backend_request(&self, frontend: &str, backend: &str, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.backend_requests_total
            .with_label_values(&[frontend, backend, status])
            .inc();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
