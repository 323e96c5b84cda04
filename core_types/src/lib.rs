//! # Core Types
//!
//! This crate defines the fundamental types shared by every layer of the
//! flight runtime.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: Handles carry their kind and generation.
//! - **Type safety first**: A task handle cannot be confused with a queue handle.
//! - **Stable wire values**: Status codes and kind numbers never change meaning.
//!
//! ## Key Types
//!
//! - [`ResourceKind`]: The fixed set of resource tables
//! - [`ResourceHandle`]: Slot index plus sequence number into a table
//! - [`TaskHandle`]: A resource handle known to refer to a task
//! - [`StatusCode`]: Numeric status reported across the external boundary

pub mod ids;
pub mod status;

pub use ids::{ResourceHandle, ResourceKind, TaskHandle};
pub use status::StatusCode;
