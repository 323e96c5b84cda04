//! Profiling transport
//!
//! Serial and network backends that carry profiling data live outside the
//! runtime. The runtime's whole obligation is to hand over a byte buffer;
//! connection setup and teardown belong to the transport.

use thiserror::Error;

/// Errors reported by a profiling transport
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The link is not up
    #[error("Transport link is down")]
    LinkDown,

    /// The transport accepted only part of the buffer
    #[error("Short write: {written} of {requested} bytes")]
    ShortWrite { written: usize, requested: usize },
}

/// Byte sink for profiling data
pub trait ProfilingTransport: Send {
    /// Hands `bytes` to the transport
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
