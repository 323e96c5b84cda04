//! # Runtime
//!
//! The portable flight-software runtime: task and periodic scheduling,
//! per-task error state, resource registries, time base, integrity checks
//! and profiling hand-off behind one explicit context object.
//!
//! ## Philosophy
//!
//! **No process-wide mutable state.** A [`Runtime`] is built from a
//! [`RuntimeConfig`] and cloned into every task. Tests build a fresh one
//! per case instead of resetting globals.
//!
//! **Backends are injected.** The tick source ([`hal::TimerDevice`]), the
//! task backend ([`hal::TaskBackend`]) and the profiling transport
//! ([`hal::ProfilingTransport`]) are traits; hosted defaults are
//! [`timer::HostTimer`] and [`backend::ThreadBackend`], and
//! [`timer::SimTimerDevice`] makes scheduling deterministic.
//!
//! **Errors are values.** Nothing in here terminates the process. Failures
//! are returned to the caller; operations a task performs through its
//! [`TaskContext`] also land in that task's error cell.

pub mod audit;
pub mod backend;
pub mod config;
pub mod context;
pub mod error_cells;
pub mod profiling;
pub mod scheduler;
pub mod test_utils;
pub mod timer;

pub use audit::{ScheduleAuditEntry, ScheduleAuditLog, ScheduleEvent};
pub use config::{ConfigError, RuntimeConfig};
pub use context::TaskContext;
pub use scheduler::{ErrorHandler, PeriodicBody, PeriodicSchedule};

use core_types::{ResourceHandle, ResourceKind, StatusCode, TaskHandle};
use error_cells::ErrorCells;
use hal::{ProfilingTransport, SpawnRequest, TaskBackend, TimerDevice};
use integrity::CrcEngine;
use kernel_api::{
    Duration, HandlerAction, Instant, PeriodicDescriptor, Priority, RtError, RtResult,
    TaskDescriptor,
};
use parking_lot::Mutex;
use profiling::{ProfileEvent, ProfileEventKind, Profiler};
use resources::{ResourceLimits, ResourcePool, ResourceStats, StatsReport};
use scheduler::{FiringOutcome, PeriodicRecord, Scheduler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Registry payload of a task slot
#[derive(Debug, Clone)]
struct TaskEntry {
    name: String,
    priority: Priority,
    stack_size: Option<usize>,
    period: Option<Duration>,
}

/// Public description of a live task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub handle: TaskHandle,
    pub name: String,
    pub priority: Priority,
    /// Stack budget of a one-shot task
    pub stack_size: Option<usize>,
    /// Period of a periodic task
    pub period: Option<Duration>,
}

struct RuntimeInner {
    config: RuntimeConfig,
    tasks: ResourcePool<TaskEntry>,
    objects: BTreeMap<ResourceKind, ResourcePool<String>>,
    error_cells: ErrorCells,
    scheduler: Mutex<Scheduler>,
    tick_lock: Mutex<()>,
    timer: Mutex<Box<dyn TimerDevice + Send>>,
    backend: Arc<dyn TaskBackend>,
    crc: CrcEngine,
    profiler: Mutex<Option<Profiler>>,
}

/// Builds a [`Runtime`] with injected backends
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    timer: Option<Box<dyn TimerDevice + Send>>,
    backend: Option<Arc<dyn TaskBackend>>,
    transport: Option<Box<dyn ProfilingTransport>>,
}

impl RuntimeBuilder {
    pub fn with_timer(mut self, timer: impl TimerDevice + Send + 'static) -> Self {
        self.timer = Some(Box::new(timer));
        self
    }

    pub fn with_backend(mut self, backend: impl TaskBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Attaches a profiler that hands event batches to `transport`
    pub fn with_profiler(mut self, transport: impl ProfilingTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> RtResult<Runtime> {
        let config = self.config;
        config.validate()?;

        let limits = config.limits;
        let tasks = ResourcePool::new(ResourceKind::Task, limits.max_tasks)?;
        let mut objects = BTreeMap::new();
        for kind in ResourceKind::ALL {
            if kind != ResourceKind::Task {
                objects.insert(kind, ResourcePool::new(kind, limits.capacity(kind))?);
            }
        }

        let timer = self
            .timer
            .unwrap_or_else(|| Box::new(timer::HostTimer::new(config.tick_period_ns)));
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(backend::ThreadBackend::new()));
        let profiler = self
            .transport
            .map(|transport| Profiler::new(transport, config.profiling_buffer_events));

        log::info!(
            "runtime ready: {} tasks, {} counting semaphores, {} binary semaphores, \
             {} mutexes, {} queues, {} timers, {} pools; tick {} ns",
            limits.max_tasks,
            limits.max_counting_semaphores,
            limits.max_binary_semaphores,
            limits.max_mutexes,
            limits.max_queues,
            limits.max_timers,
            limits.max_pools,
            config.tick_period_ns,
        );

        Ok(Runtime {
            inner: Arc::new(RuntimeInner {
                error_cells: ErrorCells::new(limits.max_tasks),
                crc: CrcEngine::with_polynomial(config.crc_polynomial),
                config,
                tasks,
                objects,
                scheduler: Mutex::new(Scheduler::new()),
                tick_lock: Mutex::new(()),
                timer: Mutex::new(timer),
                backend,
                profiler: Mutex::new(profiler),
            }),
        })
    }
}

/// Shared handle to one runtime instance
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder {
            config,
            timer: None,
            backend: None,
            transport: None,
        }
    }

    /// Runtime on the host clock and OS threads
    pub fn new(config: RuntimeConfig) -> RtResult<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Configured table capacities
    pub fn capacities(&self) -> ResourceLimits {
        self.inner.config.limits
    }

    /// Current time on the runtime's timeline
    pub fn now(&self) -> Instant {
        let ticks = self.inner.timer.lock().poll_ticks();
        Instant::from_nanos(ticks.saturating_mul(self.inner.config.tick_period_ns))
    }

    /// Creates a one-shot task and starts it on the backend
    ///
    /// The task's slot and error cell are released when `entry` returns,
    /// unless the task exited or was deleted first.
    pub fn create_task<F>(&self, descriptor: TaskDescriptor, entry: F) -> RtResult<TaskHandle>
    where
        F: FnOnce(&TaskContext) + Send + 'static,
    {
        self.check_name_and_priority(&descriptor.name, descriptor.priority)?;
        if descriptor.stack_size < self.inner.config.min_stack_size {
            return Err(RtError::InvalidParameter("stack budget below minimum"));
        }

        let task = self.register_task(TaskEntry {
            name: descriptor.name.clone(),
            priority: descriptor.priority,
            stack_size: Some(descriptor.stack_size),
            period: None,
        })?;
        self.profile(ProfileEventKind::Created, task.resource());
        self.audit(ScheduleEvent::TaskCreated {
            task,
            periodic: false,
        });

        let ctx = TaskContext::new(self.clone(), task);
        let job = move || {
            if catch_unwind(AssertUnwindSafe(|| entry(&ctx))).is_err() {
                log::warn!("{} panicked", ctx.handle());
            }
            ctx.runtime().release_task(ctx.handle());
        };

        let request = SpawnRequest {
            name: descriptor.name,
            priority: descriptor.priority,
            stack_size: descriptor.stack_size,
        };
        if let Err(err) = self.inner.backend.spawn(request, Box::new(job)) {
            log::warn!("backend refused {}: {}", task, err);
            if let Err(cleanup) = self.delete_task(task) {
                log::debug!("cleanup of {} after refused spawn: {}", task, cleanup);
            }
            return Err(RtError::BackendFailure(err.to_string()));
        }

        Ok(task)
    }

    /// Creates a periodic task fired by [`Runtime::tick`]
    ///
    /// The first deadline is one period from now. When `body` fails, the
    /// code is written to the task's error cell and `on_error` decides
    /// whether the task keeps its schedule.
    pub fn create_periodic_task<B, H>(
        &self,
        descriptor: PeriodicDescriptor,
        body: B,
        on_error: H,
    ) -> RtResult<TaskHandle>
    where
        B: FnMut(&TaskContext) -> Result<(), StatusCode> + Send + 'static,
        H: FnMut(TaskHandle, StatusCode) -> HandlerAction + Send + 'static,
    {
        self.check_name_and_priority(&descriptor.name, descriptor.priority)?;
        if descriptor.period.is_zero() {
            return Err(RtError::InvalidParameter("period must be non-zero"));
        }

        // The slot must not become visible before its record is scheduled,
        // or a concurrent delete_task would miss the record.
        let (task, schedule) = {
            let mut scheduler = self.inner.scheduler.lock();
            let task = self.register_task(TaskEntry {
                name: descriptor.name,
                priority: descriptor.priority,
                stack_size: None,
                period: Some(descriptor.period.normalize()),
            })?;
            let now = self.now();
            let record = Arc::new(PeriodicRecord::new(task, Box::new(body), Box::new(on_error)));
            let schedule = PeriodicSchedule::new(now, descriptor.period);
            scheduler.insert(record, schedule);
            scheduler.audit_mut().record_event(
                now,
                ScheduleEvent::TaskCreated {
                    task,
                    periodic: true,
                },
            );
            (task, schedule)
        };
        self.profile(ProfileEventKind::Created, task.resource());
        log::debug!(
            "{} scheduled every {} ns, first deadline {} ns",
            task,
            schedule.period().as_nanos(),
            schedule.next_deadline().as_nanos()
        );

        Ok(task)
    }

    /// Deletes a task
    ///
    /// A periodic task is unscheduled atomically with respect to
    /// [`Runtime::tick`]: a firing in progress on another thread completes
    /// before this returns, and none starts afterwards.
    pub fn delete_task(&self, task: TaskHandle) -> RtResult<()> {
        let now = self.now();
        let (deleted, record) = {
            let mut scheduler = self.inner.scheduler.lock();
            let deleted = self.inner.tasks.delete(task.resource());
            // Unschedule even when the slot is already gone; no record may
            // outlive its task.
            let record = scheduler.remove(task);
            if deleted.is_ok() {
                self.inner.error_cells.disarm(task);
                scheduler
                    .audit_mut()
                    .record_event(now, ScheduleEvent::TaskDeleted { task });
            }
            (deleted, record)
        };

        if let Some(record) = record {
            if deleted.is_err() {
                log::warn!("{} unscheduled without a live slot", task);
            }
            record.wait_idle();
        }
        deleted?;
        self.profile(ProfileEventKind::Deleted, task.resource());
        Ok(())
    }

    pub fn task_info(&self, task: TaskHandle) -> RtResult<TaskInfo> {
        self.inner
            .tasks
            .with_entry(task.resource(), |entry| TaskInfo {
                handle: task,
                name: entry.name.clone(),
                priority: entry.priority,
                stack_size: entry.stack_size,
                period: entry.period,
            })
    }

    /// Looks a live task up by name
    pub fn find_task(&self, name: &str) -> RtResult<TaskHandle> {
        let handle = self
            .inner
            .tasks
            .find(|entry| entry.name == name)
            .map_err(|_| RtError::NotFound(format!("task '{}'", name)))?;
        TaskHandle::from_resource(handle).ok_or(RtError::InvalidHandle(handle))
    }

    /// Handles of all live tasks, in slot order
    pub fn task_handles(&self) -> Vec<TaskHandle> {
        self.inner
            .tasks
            .handles()
            .into_iter()
            .filter_map(TaskHandle::from_resource)
            .collect()
    }

    /// Most recent failure recorded for `task`, or `SUCCESS`
    pub fn get_error(&self, task: TaskHandle) -> RtResult<StatusCode> {
        self.inner.error_cells.get(task)
    }

    /// Read-only deadline state of a periodic task
    pub fn periodic_status(&self, task: TaskHandle) -> RtResult<PeriodicSchedule> {
        self.inner
            .scheduler
            .lock()
            .schedule(task)
            .ok_or(RtError::InvalidHandle(task.resource()))
    }

    pub fn periodic_count(&self) -> usize {
        self.inner.scheduler.lock().len()
    }

    /// Fires every periodic task that is due, once each
    ///
    /// Called by the external tick generator. Returns the number of bodies
    /// run. A tick that starts while another is still running does nothing.
    pub fn tick(&self) -> usize {
        let Some(_serial) = self.inner.tick_lock.try_lock() else {
            log::debug!("tick skipped: previous tick still running");
            return 0;
        };

        let now = self.now();
        let due = self.inner.scheduler.lock().due(now);
        let mut fired = 0;
        for (record, deadline) in due {
            if self.fire(&record, deadline, now) {
                fired += 1;
            }
        }
        fired
    }

    fn fire(&self, record: &PeriodicRecord, deadline: Instant, now: Instant) -> bool {
        let task = record.task();
        let ctx = TaskContext::new(self.clone(), task);
        let outcome = record.fire(&ctx, |code| {
            let _ = self.inner.error_cells.set(task, code);
        });
        let Some(outcome) = outcome else {
            return false;
        };

        let (event, stop) = match outcome {
            FiringOutcome::Succeeded => {
                log::debug!("{} fired for deadline {} ns", task, deadline.as_nanos());
                (ScheduleEvent::PeriodicFired { task, deadline }, false)
            }
            FiringOutcome::Failed { code, action } => {
                log::warn!("{} failed at deadline {} ns: {}", task, deadline.as_nanos(), code);
                (
                    ScheduleEvent::PeriodicFailed {
                        task,
                        deadline,
                        code,
                    },
                    action == HandlerAction::Stop,
                )
            }
        };
        let profile_kind = match event {
            ScheduleEvent::PeriodicFailed { .. } => ProfileEventKind::PeriodicFailed,
            _ => ProfileEventKind::PeriodicFired,
        };

        {
            let mut scheduler = self.inner.scheduler.lock();
            scheduler.audit_mut().record_event(now, event);
            if let Some(skipped) = scheduler.complete(task, now).filter(|s| *s > 0) {
                log::warn!("{} overran: skipped {} deadline(s)", task, skipped);
                scheduler
                    .audit_mut()
                    .record_event(now, ScheduleEvent::DeadlinesSkipped { task, skipped });
            }
        }
        self.profile(profile_kind, task.resource());

        if stop {
            log::info!("{} stopped by its error handler", task);
            self.audit(ScheduleEvent::PeriodicStopped { task });
            if let Err(err) = self.delete_task(task) {
                log::debug!("{} already gone when stopping: {}", task, err);
            }
        }
        true
    }

    /// Creates a non-task resource (semaphore, mutex, queue, timer, pool)
    pub fn create_object(
        &self,
        kind: ResourceKind,
        name: impl Into<String>,
    ) -> RtResult<ResourceHandle> {
        let handle = self.object_pool(kind)?.create(name.into())?;
        self.profile(ProfileEventKind::Created, handle);
        Ok(handle)
    }

    pub fn delete_object(&self, handle: ResourceHandle) -> RtResult<()> {
        self.object_pool(handle.kind())?.delete(handle)?;
        self.profile(ProfileEventKind::Deleted, handle);
        Ok(())
    }

    pub fn object_name(&self, handle: ResourceHandle) -> RtResult<String> {
        self.object_pool(handle.kind())?.get_cloned(handle)
    }

    /// Counters of one resource kind
    pub fn stats(&self, kind: ResourceKind) -> ResourceStats {
        match kind {
            ResourceKind::Task => self.inner.tasks.stats(),
            _ => self
                .inner
                .objects
                .get(&kind)
                .map(ResourcePool::stats)
                .unwrap_or_default(),
        }
    }

    /// Counters of every kind, in report order
    pub fn stats_report(&self) -> StatsReport {
        ResourceKind::ALL
            .iter()
            .fold(StatsReport::new(), |report, kind| {
                report.with_kind(*kind, self.stats(*kind))
            })
    }

    /// CRC of `data` with the configured polynomial
    pub fn checksum(&self, data: &[u8]) -> RtResult<u32> {
        self.inner
            .crc
            .checksum(data)
            .map_err(|_| RtError::InvalidParameter("checksum needs at least 4 bytes"))
    }

    pub fn crc_engine(&self) -> &CrcEngine {
        &self.inner.crc
    }

    /// Snapshot of the scheduling audit trail, oldest first
    pub fn audit_events(&self) -> Vec<ScheduleAuditEntry> {
        self.inner.scheduler.lock().audit().get_events()
    }

    /// Runs `f` against the audit trail under the scheduler lock
    pub fn with_audit_log<R>(&self, f: impl FnOnce(&ScheduleAuditLog) -> R) -> R {
        f(self.inner.scheduler.lock().audit())
    }

    /// Hands buffered profiling events to the transport
    pub fn flush_profiler(&self) -> RtResult<()> {
        match self.inner.profiler.lock().as_mut() {
            Some(profiler) => profiler
                .flush()
                .map_err(|err| RtError::BackendFailure(err.to_string())),
            None => Err(RtError::NotInitialized("no profiler attached")),
        }
    }

    pub(crate) fn error_cells(&self) -> &ErrorCells {
        &self.inner.error_cells
    }

    pub(crate) fn backend(&self) -> &dyn TaskBackend {
        self.inner.backend.as_ref()
    }

    /// Frees a finished one-shot task unless it is already gone
    fn release_task(&self, task: TaskHandle) {
        if self.inner.tasks.contains(task.resource()) {
            if let Err(err) = self.delete_task(task) {
                log::debug!("{} released concurrently: {}", task, err);
            }
        }
    }

    fn register_task(&self, entry: TaskEntry) -> RtResult<TaskHandle> {
        let handle = self.inner.tasks.create(entry)?;
        let task = TaskHandle::from_resource(handle).ok_or(RtError::InvalidHandle(handle))?;
        if let Err(err) = self.inner.error_cells.arm(task) {
            let _ = self.inner.tasks.delete(handle);
            return Err(err);
        }
        Ok(task)
    }

    fn check_name_and_priority(&self, name: &str, priority: Priority) -> RtResult<()> {
        if name.is_empty() {
            return Err(RtError::InvalidParameter("task name must not be empty"));
        }
        if u16::from(priority) >= self.inner.config.priority_levels {
            return Err(RtError::InvalidParameter("priority out of range"));
        }
        Ok(())
    }

    fn object_pool(&self, kind: ResourceKind) -> RtResult<&ResourcePool<String>> {
        self.inner
            .objects
            .get(&kind)
            .ok_or(RtError::InvalidParameter("tasks are managed with create_task"))
    }

    fn audit(&self, event: ScheduleEvent) {
        let now = self.now();
        self.inner
            .scheduler
            .lock()
            .audit_mut()
            .record_event(now, event);
    }

    fn profile(&self, kind: ProfileEventKind, resource: ResourceHandle) {
        let mut profiler = self.inner.profiler.lock();
        if let Some(profiler) = profiler.as_mut() {
            let event = ProfileEvent::new(kind, resource, self.now());
            if let Err(err) = profiler.record(&event) {
                log::warn!("profiling hand-off failed: {}", err);
            }
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("tasks", &self.inner.tasks.len())
            .field("periodic", &self.periodic_count())
            .finish()
    }
}
