//! # Integrity
//!
//! Checksums for validating packets, tables and recorded data.
//!
//! ## Philosophy
//!
//! - **Bit-exact**: Checksums recorded on the ground and in flight must agree,
//!   so the algorithm is fixed, including its non-reflected form.
//! - **Lazy, once**: Lookup tables are built on first use, exactly once,
//!   even if several tasks race to use them.
//! - **No dependencies on the runtime**: Callable from any layer.

pub mod crc;

pub use crate::crc::{checksum, default_engine, CrcEngine, CrcError, CrcTable, DEFAULT_POLYNOMIAL};
