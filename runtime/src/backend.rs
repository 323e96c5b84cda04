//! Hosted task backend: one OS thread per task

use hal::{BackendError, SpawnRequest, TaskBackend};
use std::time::Duration;

/// Smallest stack a hosted task thread is given
pub const HOST_MIN_STACK: usize = 256 * 1024;

/// Runs each task on its own named `std::thread`
///
/// Priorities are advisory on a hosted system and are not forwarded.
/// Stack budgets below [`HOST_MIN_STACK`] are raised to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBackend;

impl ThreadBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TaskBackend for ThreadBackend {
    fn spawn(
        &self,
        request: SpawnRequest,
        job: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), BackendError> {
        std::thread::Builder::new()
            .name(request.name.clone())
            .stack_size(request.stack_size.max(HOST_MIN_STACK))
            .spawn(job)
            .map(|_| ())
            .map_err(|e| BackendError::SpawnRefused {
                name: request.name,
                reason: e.to_string(),
            })
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
