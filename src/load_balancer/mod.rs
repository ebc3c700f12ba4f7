// src/load_balancer/mod.rs
mod algorithm;
mod round_robin;

pub use algorithm::BackendPool; // trait
pub use round_robin::RoundRobinPool;

use std::sync::Arc;

/// Strategy name used when a frontend does not configure one.
pub const DEFAULT_STRATEGY: &str = "roundrobin";

fn is_round_robin(strategy: &str) -> bool {
    matches!(
        strategy.to_ascii_lowercase().as_str(),
        "roundrobin" | "round_robin" | "round-robin"
    )
}

/// Builds the pool for one frontend from its resolved `(name, address)` list.
pub fn create_backend_pool<I, N, A>(strategy: &str, backends: I) -> Arc<dyn BackendPool>
where
    I: IntoIterator<Item = (N, A)>,
    N: Into<String>,
    A: Into<String>,
{
    if !is_round_robin(strategy) {
        tracing::warn!(
            "Unsupported load balancing strategy {:?}, falling back to round robin",
            strategy
        );
    }
    Arc::new(RoundRobinPool::new(backends))
}
