//! Kernel task backend
//!
//! The runtime decides *which* tasks exist and keeps their bookkeeping;
//! the backend decides *how* a task gets a thread of execution and how it
//! is parked. Every kernel port implements this one trait.

use core::time::Duration;
use thiserror::Error;

/// Errors reported by a task backend
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The kernel refused to create the execution context
    #[error("Spawn refused for task '{name}': {reason}")]
    SpawnRefused { name: String, reason: String },
}

/// What the runtime asks the backend to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Task name, forwarded to the kernel where supported
    pub name: String,
    /// Runtime priority (lower is more urgent)
    pub priority: u8,
    /// Stack budget in bytes
    pub stack_size: usize,
}

/// Kernel-specific task primitives
pub trait TaskBackend: Send + Sync {
    /// Starts `job` in a new execution context
    ///
    /// Returning `Ok` means `job` will run exactly once.
    fn spawn(
        &self,
        request: SpawnRequest,
        job: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), BackendError>;

    /// Parks the calling context for at least `duration`
    ///
    /// Must not busy-wait and must not hold up other contexts.
    fn sleep(&self, duration: Duration);
}
