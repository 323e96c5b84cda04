//! Test utilities for deterministic runtime tests
//!
//! [`ManualBackend`] queues spawned task entries instead of starting
//! threads; the test decides when they run. Together with
//! [`SimTimerDevice`] this makes a whole runtime single-threaded and
//! reproducible.

use crate::config::RuntimeConfig;
use crate::timer::SimTimerDevice;
use crate::Runtime;
use hal::{BackendError, SpawnRequest, TaskBackend};
use kernel_api::RtResult;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct ManualState {
    jobs: Vec<(SpawnRequest, Job)>,
    spawned: Vec<SpawnRequest>,
    slept: Vec<Duration>,
    refuse_spawns: bool,
}

/// Task backend that runs entries only when asked
///
/// Clones share one queue.
#[derive(Clone, Default)]
pub struct ManualBackend {
    state: Arc<Mutex<ManualState>>,
}

impl ManualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later spawn fail
    pub fn refuse_spawns(&self, refuse: bool) {
        self.state.lock().refuse_spawns = refuse;
    }

    pub fn pending(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Every request accepted so far, in spawn order
    pub fn spawned(&self) -> Vec<SpawnRequest> {
        self.state.lock().spawned.clone()
    }

    /// Durations passed to `sleep`, which returns immediately
    pub fn slept(&self) -> Vec<Duration> {
        self.state.lock().slept.clone()
    }

    /// Runs queued entries, including ones they spawn, until none are left
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let jobs = std::mem::take(&mut self.state.lock().jobs);
            if jobs.is_empty() {
                return ran;
            }
            for (_, job) in jobs {
                job();
                ran += 1;
            }
        }
    }
}

impl TaskBackend for ManualBackend {
    fn spawn(&self, request: SpawnRequest, job: Job) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.refuse_spawns {
            return Err(BackendError::SpawnRefused {
                name: request.name,
                reason: "refused by test".to_string(),
            });
        }
        state.spawned.push(request.clone());
        state.jobs.push((request, job));
        Ok(())
    }

    fn sleep(&self, duration: Duration) {
        self.state.lock().slept.push(duration);
    }
}

/// A runtime wired to a simulated timer and a manual backend
pub struct SimHarness {
    pub runtime: Runtime,
    pub timer: SimTimerDevice,
    pub backend: ManualBackend,
}

impl SimHarness {
    pub fn new(config: RuntimeConfig) -> RtResult<Self> {
        let timer = SimTimerDevice::new();
        let backend = ManualBackend::new();
        let runtime = Runtime::builder(config)
            .with_timer(timer.clone())
            .with_backend(backend.clone())
            .build()?;
        Ok(Self {
            runtime,
            timer,
            backend,
        })
    }

    /// Harness with default limits and a 1 ns tick
    pub fn with_defaults() -> RtResult<Self> {
        Self::new(RuntimeConfig::default().with_tick_period_ns(1))
    }

    /// Moves time to `ticks` and runs one scheduler tick
    pub fn tick_at(&self, ticks: u64) -> usize {
        self.timer.set_ticks(ticks);
        self.runtime.tick()
    }

    pub fn advance_and_tick(&self, delta: u64) -> usize {
        self.timer.advance_ticks(delta);
        self.runtime.tick()
    }

    pub fn run_tasks(&self) -> usize {
        self.backend.run_pending()
    }
}
