// src/load_balancer/round_robin.rs
use crate::load_balancer::BackendPool;
use crate::proxy::Backend;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Round-robin rotation over a ring of backends.
///
/// The front of the deque is the cursor: `choose` hands it out and moves it
/// to the back. One mutex serializes selection and membership changes, and
/// it is only ever held for the duration of a single call.
pub struct RoundRobinPool {
    ring: Mutex<VecDeque<Arc<Backend>>>,
}

impl RoundRobinPool {
    /// Builds the ring from `(name, address)` pairs, in iteration order.
    pub fn new<I, N, A>(backends: I) -> Self
    where
        I: IntoIterator<Item = (N, A)>,
        N: Into<String>,
        A: Into<String>,
    {
        let ring = backends
            .into_iter()
            .map(|(name, address)| Arc::new(Backend::new(name, address)))
            .collect();

        Self {
            ring: Mutex::new(ring),
        }
    }

    pub fn empty() -> Self {
        Self {
            ring: Mutex::new(VecDeque::new()),
        }
    }

    // Nothing in a critical section can panic half-way through a mutation,
    // so a poisoned ring is still a valid ring.
    fn ring(&self) -> MutexGuard<'_, VecDeque<Arc<Backend>>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RoundRobinPool {
    fn default() -> Self {
        Self::empty()
    }
}

impl BackendPool for RoundRobinPool {
    fn choose(&self) -> Option<Arc<Backend>> {
        let mut ring = self.ring();
        let backend = ring.pop_front()?;
        ring.push_back(backend.clone());
        Some(backend)
    }

    fn len(&self) -> usize {
        self.ring().len()
    }

    fn add(&self, name: &str, address: &str) {
        let backend = Arc::new(Backend::new(name, address));
        let size = {
            let mut ring = self.ring();
            ring.push_back(backend.clone());
            ring.len()
        };
        tracing::info!(backend = %backend, size, "Added backend");
    }

    fn remove(&self, address: &str) {
        let removed = {
            let mut ring = self.ring();
            let len = ring.len();
            (1..=len)
                .map(|offset| offset % len)
                .find(|&index| ring[index].address() == address)
                .and_then(|index| ring.remove(index))
                .map(|backend| (backend, ring.len()))
        };

        match removed {
            Some((backend, size)) => tracing::info!(backend = %backend, size, "Removed backend"),
            None => tracing::debug!(address, "No backend to remove"),
        }
    }

    fn snapshot(&self) -> Vec<Arc<Backend>> {
        self.ring().iter().cloned().collect()
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
