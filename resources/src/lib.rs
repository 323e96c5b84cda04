//! # Resources
//!
//! This crate provides the fixed-capacity resource tables every manager in
//! the runtime allocates from: tasks, semaphores, mutexes, queues, timers
//! and memory pools.
//!
//! ## Philosophy
//!
//! - **Resources are finite and must be explicit**: capacities are fixed at
//!   configuration time and tables never grow
//! - **Exhaustion is a reported condition**, never undefined behavior
//! - **Accounting is deterministic and testable**: lowest free slot first,
//!   counters updated in the same critical section as occupancy
//! - **Stale handles are detected**: every slot reuse changes the sequence
//!
//! ## Core Concepts
//!
//! - [`ResourceTable`]: single-owner table of slots with statistics
//! - [`ResourcePool`]: a table behind a lock, shareable between tasks
//! - [`ResourceLimits`]: configured capacity per kind
//! - [`ResourceStats`] / [`StatsReport`]: created/deleted/current counters
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A general-purpose allocator
//! - Blocking semantics for semaphores, queues or mutexes

pub mod limits;
pub mod pool;
pub mod stats;
pub mod table;

pub use limits::ResourceLimits;
pub use pool::ResourcePool;
pub use stats::{KindStats, ResourceStats, StatsReport};
pub use table::{ResourceTable, MAX_TABLE_CAPACITY};
