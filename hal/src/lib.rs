//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the seams between the portable runtime and the board
//! or kernel underneath it.
//!
//! ## Philosophy
//!
//! **Targets must be fully abstracted and swappable.**
//!
//! No board-specific or kernel-specific assumptions leak into the runtime.
//! The HAL provides traits that backend crates implement, plus the few
//! utilities (byte order) whose behavior depends only on the host CPU.
//!
//! ## Design Principles
//!
//! 1. **No endianness assumptions**: Wire formats go through [`byte_order`]
//! 2. **Trait-based**: Ticks, task parking and transports are traits
//! 3. **Testable**: Every trait can be implemented in-process for tests

pub mod byte_order;
pub mod task_backend;
pub mod timer;
pub mod transport;

pub use byte_order::{
    host_is_big_endian, read_u16_be, read_u32_be, to_host_16, to_host_32, to_network_16,
    to_network_32, write_u16_be, write_u32_be, Endianness,
};
pub use task_backend::{BackendError, SpawnRequest, TaskBackend};
pub use timer::TimerDevice;
pub use transport::{ProfilingTransport, TransportError};
