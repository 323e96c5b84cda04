//! Task descriptors and scheduling types

use crate::time::Duration;
use serde::{Deserialize, Serialize};

/// Task priority; lower numbers are more urgent
///
/// Valid values are `0..priority_levels` of the runtime configuration.
pub type Priority = u8;

/// Descriptor for creating a one-shot task
///
/// Creation is explicit: the caller names the task and states its
/// priority and stack budget up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Human-readable name for diagnostics
    pub name: String,
    /// Scheduling priority
    pub priority: Priority,
    /// Stack budget in bytes
    pub stack_size: usize,
}

impl TaskDescriptor {
    /// Default stack budget in bytes
    pub const DEFAULT_STACK_SIZE: usize = 16 * 1024;

    /// Default priority
    pub const DEFAULT_PRIORITY: Priority = 100;

    /// Creates a descriptor with default priority and stack budget
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Self::DEFAULT_PRIORITY,
            stack_size: Self::DEFAULT_STACK_SIZE,
        }
    }

    /// Builder: sets the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: sets the stack budget
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }
}

/// Descriptor for creating a fixed-rate periodic task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicDescriptor {
    /// Human-readable name for diagnostics
    pub name: String,
    /// Scheduling priority
    pub priority: Priority,
    /// Time between consecutive deadlines
    pub period: Duration,
}

impl PeriodicDescriptor {
    /// Creates a descriptor with default priority
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            priority: TaskDescriptor::DEFAULT_PRIORITY,
            period,
        }
    }

    /// Builder: sets the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// What a periodic task's error handler wants done after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerAction {
    /// Keep the task on its schedule
    Continue,
    /// Delete the task; it will not fire again
    Stop,
}
