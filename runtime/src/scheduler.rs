//! Fixed-rate periodic scheduling
//!
//! ## Design
//!
//! - **Tick driven**: nothing here owns a thread. An external tick source
//!   calls [`crate::Runtime::tick`], which asks the scheduler which
//!   records are due and fires each of them once.
//! - **Grid anchored**: a record created at `t0` with period `P` has
//!   deadlines `t0 + P`, `t0 + 2P`, ... After a firing the deadline moves
//!   by one period. If that is still not in the future the record is late;
//!   the passed deadlines are counted as missed and skipped, so a late
//!   tick costs at most one catch-up firing and never shifts the grid.
//! - **Cancellation**: a record is removed from the table and flagged
//!   under the scheduler lock. A firing already running finishes first;
//!   no firing starts afterwards.

use crate::audit::ScheduleAuditLog;
use crate::context::TaskContext;
use core_types::{StatusCode, TaskHandle};
use kernel_api::{Duration, HandlerAction, Instant};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Body of a periodic task, run once per deadline
pub type PeriodicBody = Box<dyn FnMut(&TaskContext) -> Result<(), StatusCode> + Send>;

/// Called synchronously with the failure code when a body fails
pub type ErrorHandler = Box<dyn FnMut(TaskHandle, StatusCode) -> HandlerAction + Send>;

/// Deadline bookkeeping of one periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicSchedule {
    period: Duration,
    next_deadline: Instant,
    firings: u64,
    missed_deadlines: u64,
}

impl PeriodicSchedule {
    /// First deadline is one period after `created_at`
    pub fn new(created_at: Instant, period: Duration) -> Self {
        let period = period.normalize();
        Self {
            period,
            next_deadline: created_at + period,
            firings: 0,
            missed_deadlines: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Completed firings
    pub fn firings(&self) -> u64 {
        self.firings
    }

    /// Deadlines skipped because the task was late
    pub fn missed_deadlines(&self) -> u64 {
        self.missed_deadlines
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// Moves to the next deadline after the task fired at `now`
    ///
    /// Returns the number of deadlines skipped.
    pub(crate) fn complete_firing(&mut self, now: Instant) -> u64 {
        self.firings += 1;
        self.next_deadline = self.next_deadline + self.period;

        let period = self.period.as_nanos().max(1);
        let next = self.next_deadline.as_nanos();
        let now = now.as_nanos();
        if next > now {
            return 0;
        }

        let skipped = (now - next) / period + 1;
        self.next_deadline = Instant::from_nanos(next.saturating_add(skipped.saturating_mul(period)));
        self.missed_deadlines += skipped;
        skipped
    }
}

/// Result of running a periodic body once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FiringOutcome {
    Succeeded,
    Failed {
        code: StatusCode,
        action: HandlerAction,
    },
}

struct PeriodicCallbacks {
    body: PeriodicBody,
    on_error: ErrorHandler,
}

/// A periodic task's callbacks and cancellation flag
pub(crate) struct PeriodicRecord {
    task: TaskHandle,
    cancelled: AtomicBool,
    callbacks: ReentrantMutex<RefCell<PeriodicCallbacks>>,
}

impl PeriodicRecord {
    pub(crate) fn new(task: TaskHandle, body: PeriodicBody, on_error: ErrorHandler) -> Self {
        Self {
            task,
            cancelled: AtomicBool::new(false),
            callbacks: ReentrantMutex::new(RefCell::new(PeriodicCallbacks { body, on_error })),
        }
    }

    pub(crate) fn task(&self) -> TaskHandle {
        self.task
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Blocks until no firing of this record is in progress
    ///
    /// Returns at once when called from the record's own body.
    pub(crate) fn wait_idle(&self) {
        drop(self.callbacks.lock());
    }

    /// Runs the body once
    ///
    /// On failure `on_failure` sees the code before the error handler
    /// does. Returns `None` if the record was cancelled or is already
    /// running further up this thread's stack.
    pub(crate) fn fire(
        &self,
        ctx: &TaskContext,
        on_failure: impl FnOnce(StatusCode),
    ) -> Option<FiringOutcome> {
        let guard = self.callbacks.lock();
        if self.is_cancelled() {
            return None;
        }
        let mut borrowed = guard.try_borrow_mut().ok()?;
        let callbacks = &mut *borrowed;

        match (callbacks.body)(ctx) {
            Ok(()) => Some(FiringOutcome::Succeeded),
            Err(code) if code.is_success() => Some(FiringOutcome::Succeeded),
            Err(code) => {
                on_failure(code);
                let action = (callbacks.on_error)(self.task, code);
                Some(FiringOutcome::Failed { code, action })
            }
        }
    }
}

struct PeriodicEntry {
    record: Arc<PeriodicRecord>,
    schedule: PeriodicSchedule,
}

/// Table of periodic records plus the audit trail
///
/// Lives behind the runtime's scheduler lock; deadline state is only
/// changed from the tick path.
pub(crate) struct Scheduler {
    entries: BTreeMap<TaskHandle, PeriodicEntry>,
    audit: ScheduleAuditLog,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            audit: ScheduleAuditLog::new(),
        }
    }

    pub(crate) fn insert(&mut self, record: Arc<PeriodicRecord>, schedule: PeriodicSchedule) {
        self.entries
            .insert(record.task(), PeriodicEntry { record, schedule });
    }

    /// Removes and cancels the record of `task`
    pub(crate) fn remove(&mut self, task: TaskHandle) -> Option<Arc<PeriodicRecord>> {
        let entry = self.entries.remove(&task)?;
        entry.record.cancel();
        Some(entry.record)
    }

    /// Records due at `now` with the deadline each one is due for, in
    /// handle order
    pub(crate) fn due(&self, now: Instant) -> Vec<(Arc<PeriodicRecord>, Instant)> {
        self.entries
            .values()
            .filter(|entry| entry.schedule.is_due(now))
            .map(|entry| (Arc::clone(&entry.record), entry.schedule.next_deadline()))
            .collect()
    }

    /// Advances the deadline of `task`; `None` if it was removed meanwhile
    pub(crate) fn complete(&mut self, task: TaskHandle, now: Instant) -> Option<u64> {
        self.entries
            .get_mut(&task)
            .map(|entry| entry.schedule.complete_firing(now))
    }

    pub(crate) fn schedule(&self, task: TaskHandle) -> Option<PeriodicSchedule> {
        self.entries.get(&task).map(|entry| entry.schedule)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn audit(&self) -> &ScheduleAuditLog {
        &self.audit
    }

    pub(crate) fn audit_mut(&mut self) -> &mut ScheduleAuditLog {
        &mut self.audit
    }
}
