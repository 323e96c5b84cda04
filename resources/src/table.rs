//! Fixed-capacity slot table
//!
//! Slots are handed out lowest index first. Each successful create stamps
//! the slot with a fresh sequence number, so a handle kept across a
//! delete/create cycle no longer resolves.

use crate::stats::ResourceStats;
use core_types::{ResourceHandle, ResourceKind};
use kernel_api::{RtError, RtResult};

/// Largest capacity a table accepts; slot indices are 16-bit
pub const MAX_TABLE_CAPACITY: usize = u16::MAX as usize + 1;

#[derive(Debug)]
struct Slot<T> {
    sequence: u32,
    payload: Option<T>,
}

/// Table of `capacity` slots for one resource kind
#[derive(Debug)]
pub struct ResourceTable<T> {
    kind: ResourceKind,
    slots: Vec<Slot<T>>,
    next_sequence: u32,
    created: u64,
    deleted: u64,
}

impl<T> ResourceTable<T> {
    /// Creates an empty table
    ///
    /// Rejects a zero capacity and capacities beyond [`MAX_TABLE_CAPACITY`].
    pub fn new(kind: ResourceKind, capacity: usize) -> RtResult<Self> {
        if capacity == 0 {
            return Err(RtError::InvalidParameter("table capacity must be non-zero"));
        }
        if capacity > MAX_TABLE_CAPACITY {
            return Err(RtError::InvalidParameter("table capacity exceeds handle range"));
        }

        let slots = (0..capacity)
            .map(|_| Slot {
                sequence: 0,
                payload: None,
            })
            .collect();

        Ok(Self {
            kind,
            slots,
            next_sequence: 1,
            created: 0,
            deleted: 0,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.payload.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.payload.is_some())
    }

    /// Claims the lowest free slot for `payload`
    pub fn create(&mut self, payload: T) -> RtResult<ResourceHandle> {
        let index = self
            .slots
            .iter()
            .position(|s| s.payload.is_none())
            .ok_or(RtError::ResourceExhausted(self.kind))?;

        let sequence = self.take_sequence();
        let slot = &mut self.slots[index];
        slot.sequence = sequence;
        slot.payload = Some(payload);
        self.created += 1;

        // index < MAX_TABLE_CAPACITY, checked in new()
        Ok(ResourceHandle::new(self.kind, index as u16, sequence))
    }

    /// Frees the slot named by `handle` and returns its payload
    pub fn delete(&mut self, handle: ResourceHandle) -> RtResult<T> {
        let index = self.resolve(handle)?;
        let payload = self.slots[index]
            .payload
            .take()
            .ok_or(RtError::InvalidHandle(handle))?;
        self.deleted += 1;
        Ok(payload)
    }

    pub fn get(&self, handle: ResourceHandle) -> RtResult<&T> {
        let index = self.resolve(handle)?;
        self.slots[index]
            .payload
            .as_ref()
            .ok_or(RtError::InvalidHandle(handle))
    }

    pub fn get_mut(&mut self, handle: ResourceHandle) -> RtResult<&mut T> {
        let index = self.resolve(handle)?;
        self.slots[index]
            .payload
            .as_mut()
            .ok_or(RtError::InvalidHandle(handle))
    }

    /// Whether `handle` names a live resource of this table
    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Iterates over live resources in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle, &T)> + '_ {
        let kind = self.kind;
        self.slots.iter().enumerate().filter_map(move |(i, slot)| {
            slot.payload
                .as_ref()
                .map(|p| (ResourceHandle::new(kind, i as u16, slot.sequence), p))
        })
    }

    /// Handles of all live resources, in slot order
    pub fn handles(&self) -> Vec<ResourceHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    pub fn stats(&self) -> ResourceStats {
        ResourceStats::from_counters(self.created, self.deleted)
    }

    fn resolve(&self, handle: ResourceHandle) -> RtResult<usize> {
        let index = handle.index() as usize;
        match self.slots.get(index) {
            Some(slot)
                if handle.kind() == self.kind
                    && slot.payload.is_some()
                    && slot.sequence == handle.sequence() =>
            {
                Ok(index)
            }
            _ => Err(RtError::InvalidHandle(handle)),
        }
    }

    fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        // 0 is never issued
        self.next_sequence = match self.next_sequence.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        sequence
    }
}
