//! Resilience Test Utilities
//!
//! Shared helpers for the cross-crate integration tests.
//!
//! ## Test Philosophy
//!
//! - **Exhaustion is recoverable**: full tables report errors and keep working
//! - **Deterministic time**: periodic behavior is checked against a simulated tick
//! - **Isolation**: one task's failures never show up in another task's state
//! - **Consistency**: counters and occupancy agree at every observable point

use core_types::ResourceKind;
use kernel_api::RtResult;
use resources::ResourceLimits;
use runtime::test_utils::SimHarness;
use runtime::RuntimeConfig;
use std::time::{Duration, Instant};

/// Limits small enough to exhaust quickly, with `capacity` slots per kind
pub fn uniform_limits(capacity: usize) -> ResourceLimits {
    ResourceKind::ALL
        .iter()
        .fold(ResourceLimits::default(), |limits, kind| {
            limits.with_capacity(*kind, capacity)
        })
}

/// Deterministic runtime: 1 ns ticks, manual backend, `capacity` slots per kind
pub fn sim_runtime(capacity: usize) -> RtResult<SimHarness> {
    SimHarness::new(
        RuntimeConfig::default()
            .with_limits(uniform_limits(capacity))
            .with_tick_period_ns(1),
    )
}

/// Polls `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}
