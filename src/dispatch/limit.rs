use std::sync::Arc;

use tokio::sync::Semaphore;

/// Counting permit pool bounding concurrent accrual requests.
///
/// A worker holds a permit only for the duration of one HTTP request, so the
/// number of requests in flight never exceeds [`RequestLimit::capacity`].
#[derive(Debug, Clone)]
pub struct RequestLimit {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl RequestLimit {
    /// Creates a pool with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held by a request.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub(crate) fn semaphore(&self) -> &Semaphore {
        &self.permits
    }
}
