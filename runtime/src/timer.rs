//! # Tick sources
//!
//! [`SimTimerDevice`] only advances when told to, which makes periodic
//! scheduling reproducible in tests. It is a cheap handle: clones share
//! one counter, so a test keeps one clone and hands the other to the
//! runtime.
//!
//! [`HostTimer`] derives ticks from the host's monotonic clock for hosted
//! deployments.

use hal::TimerDevice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Simulated timer device with controllable time progression
///
/// # Examples
///
/// ```
/// use runtime::timer::SimTimerDevice;
/// use hal::TimerDevice;
///
/// let timer = SimTimerDevice::new();
/// let mut device = timer.clone();
///
/// timer.advance_ticks(100);
/// assert_eq!(device.poll_ticks(), 100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimTimerDevice {
    ticks: Arc<AtomicU64>,
}

impl SimTimerDevice {
    /// Creates a new simulated timer starting at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new simulated timer starting at a specific tick count
    pub fn with_initial_ticks(ticks: u64) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(ticks)),
        }
    }

    /// Advances the timer by `delta` ticks
    ///
    /// # Panics
    ///
    /// Panics if advancing would overflow u64.
    pub fn advance_ticks(&self, delta: u64) {
        let advanced = self
            .ticks
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| t.checked_add(delta));
        if advanced.is_err() {
            panic!("Timer tick overflow");
        }
    }

    /// Moves the timer forward to `new_ticks`
    ///
    /// # Panics
    ///
    /// Panics if `new_ticks` is behind the current count.
    pub fn set_ticks(&self, new_ticks: u64) {
        let previous = self.ticks.fetch_max(new_ticks, Ordering::AcqRel);
        assert!(
            new_ticks >= previous,
            "Cannot set ticks backwards: {} < {}",
            new_ticks,
            previous
        );
    }

    /// Current tick count without going through the device trait
    pub fn current_ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

impl TimerDevice for SimTimerDevice {
    fn poll_ticks(&mut self) -> u64 {
        self.current_ticks()
    }
}

/// Tick source backed by the host monotonic clock
#[derive(Debug, Clone)]
pub struct HostTimer {
    origin: std::time::Instant,
    tick_period_ns: u64,
}

impl HostTimer {
    /// Starts counting from now; `tick_period_ns` must be non-zero
    pub fn new(tick_period_ns: u64) -> Self {
        Self {
            origin: std::time::Instant::now(),
            tick_period_ns: tick_period_ns.max(1),
        }
    }
}

impl TimerDevice for HostTimer {
    fn poll_ticks(&mut self) -> u64 {
        let elapsed = self.origin.elapsed().as_nanos();
        u64::try_from(elapsed / u128::from(self.tick_period_ns)).unwrap_or(u64::MAX)
    }
}
