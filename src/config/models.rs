// src/config/models.rs
use anyhow::{bail, Context, Result};
use hyper::http::uri::Authority;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::load_balancer::{create_backend_pool, DEFAULT_STRATEGY};
use crate::server::{parse_bind, Frontend};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub frontends: BTreeMap<String, FrontendConfig>,
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    pub bind: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Keys into [`Config::backends`].
    #[serde(default)]
    pub backends: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// `host:port` requests are forwarded to.
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_strategy() -> String {
    DEFAULT_STRATEGY.to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.frontends.is_empty() {
            bail!("No frontends configured");
        }

        for (name, frontend) in &self.frontends {
            parse_bind(&frontend.bind)
                .with_context(|| format!("Frontend {:?} has an invalid bind", name))?;
        }

        for (key, backend) in &self.backends {
            backend
                .host
                .parse::<Authority>()
                .with_context(|| format!("Backend {:?} has an invalid host {:?}", key, backend.host))?;
        }

        if self.metrics.enabled && !self.metrics.path.starts_with('/') {
            bail!("Metrics path must start with '/': {:?}", self.metrics.path);
        }

        Ok(())
    }

    /// Resolves a frontend's backend keys to `(key, host)` pairs, in list
    /// order. Unknown keys are skipped; repeated keys are kept once.
    pub fn resolve_backends(&self, frontend: &str, keys: &[String]) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        keys.iter()
            .filter(|key| seen.insert(*key))
            .filter_map(|key| match self.backends.get(key) {
                Some(backend) => Some((key.clone(), backend.host.clone())),
                None => {
                    tracing::warn!(frontend, backend = %key, "Unknown backend key, skipping");
                    None
                }
            })
            .collect()
    }

    pub fn build_frontends(&self) -> Result<Vec<Frontend>> {
        self.frontends
            .iter()
            .map(|(name, frontend)| {
                let bind = parse_bind(&frontend.bind)
                    .with_context(|| format!("Frontend {:?} has an invalid bind", name))?;
                let backends = self.resolve_backends(name, &frontend.backends);
                if backends.is_empty() {
                    tracing::warn!(frontend = %name, "Frontend has no backends, every request will get 503");
                }

                Ok(Frontend {
                    name: name.clone(),
                    bind,
                    strategy: frontend.strategy.clone(),
                    backends: create_backend_pool(&frontend.strategy, backends),
                })
            })
            .collect()
    }
}
