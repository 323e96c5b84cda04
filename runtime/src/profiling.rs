//! Profiling event codec and batching
//!
//! Each event is a fixed 16-byte big-endian record:
//!
//! | offset | width | field                        |
//! |--------|-------|------------------------------|
//! | 0      | 1     | event kind                   |
//! | 1      | 1     | resource kind                |
//! | 2      | 2     | slot index                   |
//! | 4      | 4     | slot sequence                |
//! | 8      | 4     | timestamp, high 32 bits (ns) |
//! | 12     | 4     | timestamp, low 32 bits (ns)  |
//!
//! Records are concatenated into batches and handed to a
//! [`ProfilingTransport`]; what happens on the wire is the transport's
//! business.

use core_types::{ResourceHandle, ResourceKind};
use hal::{read_u16_be, read_u32_be, write_u16_be, write_u32_be, ProfilingTransport, TransportError};
use kernel_api::Instant;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Size of one encoded event
pub const EVENT_LEN: usize = 16;

/// What happened to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProfileEventKind {
    Created = 1,
    Deleted = 2,
    PeriodicFired = 3,
    PeriodicFailed = 4,
}

impl ProfileEventKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Created),
            2 => Some(Self::Deleted),
            3 => Some(Self::PeriodicFired),
            4 => Some(Self::PeriodicFailed),
            _ => None,
        }
    }
}

/// Decoding failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Record too short: {0} bytes")]
    Truncated(usize),
    #[error("Unknown event kind {0}")]
    UnknownEvent(u8),
    #[error("Unknown resource kind {0}")]
    UnknownResource(u8),
}

/// One profiling event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileEvent {
    pub kind: ProfileEventKind,
    pub resource: ResourceHandle,
    pub timestamp: Instant,
}

impl ProfileEvent {
    pub fn new(kind: ProfileEventKind, resource: ResourceHandle, timestamp: Instant) -> Self {
        Self {
            kind,
            resource,
            timestamp,
        }
    }

    pub fn encode(&self) -> [u8; EVENT_LEN] {
        let mut buf = [0u8; EVENT_LEN];
        let nanos = self.timestamp.as_nanos();
        buf[0] = self.kind as u8;
        buf[1] = self.resource.kind().as_u8();
        write_u16_be(&mut buf, 2, self.resource.index());
        write_u32_be(&mut buf, 4, self.resource.sequence());
        write_u32_be(&mut buf, 8, (nanos >> 32) as u32);
        write_u32_be(&mut buf, 12, nanos as u32);
        buf
    }

    /// Decodes the record at the start of `buf`
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < EVENT_LEN {
            return Err(DecodeError::Truncated(buf.len()));
        }
        let kind = ProfileEventKind::from_u8(buf[0]).ok_or(DecodeError::UnknownEvent(buf[0]))?;
        let resource_kind =
            ResourceKind::from_u8(buf[1]).ok_or(DecodeError::UnknownResource(buf[1]))?;

        let truncated = || DecodeError::Truncated(buf.len());
        let index = read_u16_be(buf, 2).ok_or_else(truncated)?;
        let sequence = read_u32_be(buf, 4).ok_or_else(truncated)?;
        let high = read_u32_be(buf, 8).ok_or_else(truncated)?;
        let low = read_u32_be(buf, 12).ok_or_else(truncated)?;

        Ok(Self {
            kind,
            resource: ResourceHandle::new(resource_kind, index, sequence),
            timestamp: Instant::from_nanos((u64::from(high) << 32) | u64::from(low)),
        })
    }

    /// Decodes a batch of concatenated records
    pub fn decode_batch(buf: &[u8]) -> Result<Vec<Self>, DecodeError> {
        if buf.len() % EVENT_LEN != 0 {
            return Err(DecodeError::Truncated(buf.len() % EVENT_LEN));
        }
        buf.chunks_exact(EVENT_LEN).map(Self::decode).collect()
    }
}

/// Buffers encoded events and hands full batches to a transport
pub struct Profiler {
    transport: Box<dyn ProfilingTransport>,
    buffer: Vec<u8>,
    batch_events: usize,
    dropped_events: u64,
}

impl Profiler {
    /// `batch_events` is clamped to at least one
    pub fn new(transport: Box<dyn ProfilingTransport>, batch_events: usize) -> Self {
        let batch_events = batch_events.max(1);
        Self {
            transport,
            buffer: Vec::with_capacity(batch_events * EVENT_LEN),
            batch_events,
            dropped_events: 0,
        }
    }

    pub fn pending_events(&self) -> usize {
        self.buffer.len() / EVENT_LEN
    }

    /// Events lost to failed hand-offs
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    pub fn record(&mut self, event: &ProfileEvent) -> Result<(), TransportError> {
        self.buffer.extend_from_slice(&event.encode());
        if self.pending_events() >= self.batch_events {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Hands buffered events to the transport
    ///
    /// The buffer is emptied even if the transport fails.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = self.transport.transmit(&self.buffer);
        if result.is_err() {
            self.dropped_events += self.pending_events() as u64;
        }
        self.buffer.clear();
        result
    }
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("pending_events", &self.pending_events())
            .field("batch_events", &self.batch_events)
            .field("dropped_events", &self.dropped_events)
            .finish()
    }
}

/// In-process transport that keeps every batch it receives
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    batches: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<Vec<u8>> {
        self.batches.lock().clone()
    }

    /// Decodes every received event, in arrival order
    pub fn events(&self) -> Result<Vec<ProfileEvent>, DecodeError> {
        let batches = self.batches.lock();
        let mut events = Vec::new();
        for batch in batches.iter() {
            events.extend(ProfileEvent::decode_batch(batch)?);
        }
        Ok(events)
    }
}

impl ProfilingTransport for LoopbackTransport {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.batches.lock().push(bytes.to_vec());
        Ok(())
    }
}
