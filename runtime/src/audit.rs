//! Scheduling audit trail
//!
//! A bounded, chronological record of task lifecycle and periodic firing
//! events. Unlike the `log` output it is queryable, so tests can assert
//! on exactly what the scheduler did and when.
//!
//! ## Example
//!
//! ```
//! use runtime::audit::{ScheduleAuditLog, ScheduleEvent};
//! use core_types::{ResourceHandle, ResourceKind, TaskHandle};
//! use kernel_api::Instant;
//!
//! let task = TaskHandle::from_resource(ResourceHandle::new(ResourceKind::Task, 0, 1)).unwrap();
//! let mut log = ScheduleAuditLog::with_capacity(16);
//! log.record_event(Instant::from_nanos(10), ScheduleEvent::TaskDeleted { task });
//!
//! assert_eq!(log.len(), 1);
//! assert_eq!(log.events_for_task(task).len(), 1);
//! ```

use core_types::{StatusCode, TaskHandle};
use kernel_api::Instant;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Events kept before the oldest are discarded
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// Scheduling event for audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    TaskCreated { task: TaskHandle, periodic: bool },
    TaskDeleted { task: TaskHandle },
    /// Body ran for the deadline and succeeded
    PeriodicFired { task: TaskHandle, deadline: Instant },
    /// Body ran for the deadline and reported `code`
    PeriodicFailed {
        task: TaskHandle,
        deadline: Instant,
        code: StatusCode,
    },
    /// Deadlines passed over while the task was late
    DeadlinesSkipped { task: TaskHandle, skipped: u64 },
    /// The error handler asked to stop the task
    PeriodicStopped { task: TaskHandle },
}

impl ScheduleEvent {
    pub fn task(&self) -> TaskHandle {
        match self {
            ScheduleEvent::TaskCreated { task, .. }
            | ScheduleEvent::TaskDeleted { task }
            | ScheduleEvent::PeriodicFired { task, .. }
            | ScheduleEvent::PeriodicFailed { task, .. }
            | ScheduleEvent::DeadlinesSkipped { task, .. }
            | ScheduleEvent::PeriodicStopped { task } => *task,
        }
    }
}

/// A single audit event with timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAuditEntry {
    /// Runtime time when the event occurred
    pub timestamp: Instant,
    pub event: ScheduleEvent,
}

#[derive(Debug)]
pub struct ScheduleAuditLog {
    events: VecDeque<ScheduleAuditEntry>,
    capacity: usize,
}

impl ScheduleAuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// A zero capacity is raised to one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_AUDIT_CAPACITY)),
            capacity,
        }
    }

    pub fn record_event(&mut self, timestamp: Instant, event: ScheduleEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(ScheduleAuditEntry { timestamp, event });
    }

    /// Returns all retained events, oldest first
    pub fn get_events(&self) -> Vec<ScheduleAuditEntry> {
        self.events.iter().cloned().collect()
    }

    pub fn events_for_task(&self, task: TaskHandle) -> Vec<&ScheduleAuditEntry> {
        self.events.iter().filter(|e| e.event.task() == task).collect()
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&ScheduleEvent) -> bool,
    {
        self.events.iter().filter(|e| predicate(&e.event)).count()
    }

    pub fn has_event<F>(&self, predicate: F) -> bool
    where
        F: Fn(&ScheduleEvent) -> bool,
    {
        self.events.iter().any(|e| predicate(&e.event))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for ScheduleAuditLog {
    fn default() -> Self {
        Self::new()
    }
}
