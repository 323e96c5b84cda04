//! # Timer Device
//!
//! Hardware abstraction for the monotonic tick that drives periodic
//! scheduling.
//!
//! ## Philosophy
//!
//! **Time is a service, not a global variable.**
//!
//! This trait provides access to a monotonic tick counter. It does NOT:
//! - Provide wall-clock time (that is `TimeOfDay`'s job)
//! - Block or sleep (polling only)
//! - Decide what runs when (that is the scheduler's job)
//!
//! Whatever generates the tick on a given board (timer interrupt, kernel
//! clock, simulation) only has to make the counter readable here.

/// Hardware timer device trait
///
/// Provides access to a monotonic tick counter. Ticks are cumulative
/// and never decrease.
///
/// # Implementation Notes
///
/// - Must be monotonic (never return a smaller value)
/// - Must not block
/// - Tick length is set by the runtime configuration, not here
///
/// # Examples
///
/// ```
/// use hal::TimerDevice;
///
/// fn elapsed<T: TimerDevice>(timer: &mut T, since: u64) -> u64 {
///     timer.poll_ticks().saturating_sub(since)
/// }
/// ```
pub trait TimerDevice {
    /// Returns the current tick count
    fn poll_ticks(&mut self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTimer {
        ticks: u64,
    }

    impl TestTimer {
        fn new() -> Self {
            Self { ticks: 0 }
        }

        fn advance(&mut self, delta: u64) {
            self.ticks += delta;
        }
    }

    impl TimerDevice for TestTimer {
        fn poll_ticks(&mut self) -> u64 {
            self.ticks
        }
    }

    #[test]
    fn test_timer_monotonic() {
        let mut timer = TestTimer::new();
        let t1 = timer.poll_ticks();
        timer.advance(100);
        let t2 = timer.poll_ticks();
        timer.advance(50);
        let t3 = timer.poll_ticks();

        assert!(t2 >= t1);
        assert!(t3 >= t2);
        assert_eq!(t3 - t1, 150);
    }

    #[test]
    fn test_timer_as_trait_object() {
        let mut timer: Box<dyn TimerDevice + Send> = Box::new(TestTimer { ticks: 7 });
        assert_eq!(timer.poll_ticks(), 7);
    }
}
