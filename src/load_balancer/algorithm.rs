// src/load_balancer/algorithm.rs
use crate::proxy::Backend;
use std::sync::Arc;

/// The rotation structure holding one frontend's backends.
///
/// Every method is safe to call from any number of tasks at once. None of
/// them block on I/O, so they are plain synchronous calls even from async
/// request handlers.
pub trait BackendPool: Send + Sync {
    /// Returns the backend at the cursor and advances the cursor by one.
    /// `None` means the pool is empty, which is a normal state.
    fn choose(&self) -> Option<Arc<Backend>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a backend into the rotation. Names and addresses are not
    /// deduplicated.
    fn add(&self, name: &str, address: &str);

    /// Removes the first backend with `address`, scanning from just after
    /// the cursor. Unknown addresses are ignored.
    fn remove(&self, address: &str);

    /// Current members in rotation order, starting at the cursor.
    fn snapshot(&self) -> Vec<Arc<Backend>>;

    fn name(&self) -> &'static str;
}
