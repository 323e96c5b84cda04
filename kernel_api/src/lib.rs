//! # Kernel API
//!
//! This crate defines the portable contract between flight software and
//! whichever kernel/board executes it.
//!
//! ## Philosophy
//!
//! The runtime provides **mechanisms**, not policies:
//! - Task creation with explicit priority and stack budget
//! - Fixed-rate periodic execution with explicit error delivery
//! - Time arithmetic that is exact and reproducible
//! - Errors that are values, never process termination
//!
//! ## Design Goals
//!
//! 1. **Determinism**: Same inputs give the same outputs on every backend
//! 2. **Explicitness**: No hidden global state
//! 3. **Type safety**: Durations, instants and calendar times are distinct types
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A dynamic memory allocator
//! - A networking stack
//! - The scheduling internals of any particular kernel

pub mod error;
pub mod kernel;
pub mod time;

pub use error::{RtError, RtResult};
pub use kernel::{HandlerAction, PeriodicDescriptor, Priority, TaskDescriptor};
pub use time::{
    add_duration, compare_duration, days_in_month, is_leap_year, normalize_duration,
    tod_to_epoch_seconds, tod_validate, Duration, Instant, TimeOfDay, EPOCH_BASE_YEAR,
    EPOCH_OFFSET_SECS,
};
