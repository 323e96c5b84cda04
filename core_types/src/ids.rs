//! Identifiers for runtime resources

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of fixed-capacity resource tables
///
/// The declaration order is the order used by statistics reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Task,
    CountingSemaphore,
    BinarySemaphore,
    Mutex,
    Queue,
    Timer,
    MemoryPool,
}

impl ResourceKind {
    /// Every kind, in report order
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Task,
        ResourceKind::CountingSemaphore,
        ResourceKind::BinarySemaphore,
        ResourceKind::Mutex,
        ResourceKind::Queue,
        ResourceKind::Timer,
        ResourceKind::MemoryPool,
    ];

    /// Label used in the statistics report
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Task => "tasks",
            ResourceKind::CountingSemaphore => "counting_semaphores",
            ResourceKind::BinarySemaphore => "binary_semaphores",
            ResourceKind::Mutex => "mutexes",
            ResourceKind::Queue => "queues",
            ResourceKind::Timer => "timers",
            ResourceKind::MemoryPool => "memory_pools",
        }
    }

    /// Stable one-byte encoding
    pub fn as_u8(&self) -> u8 {
        match self {
            ResourceKind::Task => 0,
            ResourceKind::CountingSemaphore => 1,
            ResourceKind::BinarySemaphore => 2,
            ResourceKind::Mutex => 3,
            ResourceKind::Queue => 4,
            ResourceKind::Timer => 5,
            ResourceKind::MemoryPool => 6,
        }
    }

    /// Decodes the one-byte encoding
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Handle to a slot in a resource table
///
/// A handle is only valid while the slot is occupied by the object it was
/// issued for: the sequence number changes every time the slot is reused,
/// so a stale handle is rejected instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    kind: ResourceKind,
    index: u16,
    sequence: u32,
}

impl ResourceHandle {
    /// Creates a handle from its parts
    pub fn new(kind: ResourceKind, index: u16, sequence: u32) -> Self {
        Self {
            kind,
            index,
            sequence,
        }
    }

    /// Returns the table this handle belongs to
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the slot index
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Returns the creation sequence number
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the opaque, always non-negative numeric form of the handle
    ///
    /// Bits 32..48 hold the slot index, bits 0..32 the sequence number.
    pub fn as_raw(&self) -> i64 {
        ((self.index as i64) << 32) | self.sequence as i64
    }

    /// Rebuilds a handle from its numeric form
    ///
    /// Returns `None` for negative values (status codes) and values with
    /// bits above the index field set.
    pub fn from_raw(kind: ResourceKind, raw: i64) -> Option<Self> {
        if raw < 0 || raw >> 48 != 0 {
            return None;
        }
        Some(Self {
            kind,
            index: (raw >> 32) as u16,
            sequence: raw as u32,
        })
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}#{}]", self.kind, self.index, self.sequence)
    }
}

/// Handle to a task
///
/// Tasks live in the `Task` resource table; this wrapper keeps task-only
/// operations from accepting a semaphore or queue handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskHandle(ResourceHandle);

impl TaskHandle {
    /// Wraps a resource handle, returning `None` unless it is a task handle
    pub fn from_resource(handle: ResourceHandle) -> Option<Self> {
        (handle.kind() == ResourceKind::Task).then_some(Self(handle))
    }

    /// Returns the underlying resource handle
    pub fn resource(&self) -> ResourceHandle {
        self.0
    }

    /// Returns the slot index in the task table
    pub fn index(&self) -> u16 {
        self.0.index()
    }

    /// Returns the creation sequence number
    pub fn sequence(&self) -> u32 {
        self.0.sequence()
    }

    /// Returns the opaque numeric form of the handle
    pub fn as_raw(&self) -> i64 {
        self.0.as_raw()
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({}#{})", self.index(), self.sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_encoding_is_stable() {
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.as_u8() as usize, i);
            assert_eq!(ResourceKind::from_u8(kind.as_u8()), Some(*kind));
        }
        assert_eq!(ResourceKind::from_u8(7), None);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ResourceKind::Task.label(), "tasks");
        assert_eq!(ResourceKind::MemoryPool.to_string(), "memory_pools");
    }

    #[test]
    fn test_raw_handle_is_non_negative() {
        let handle = ResourceHandle::new(ResourceKind::Queue, u16::MAX, u32::MAX);
        assert!(handle.as_raw() >= 0);
        assert_eq!(
            ResourceHandle::from_raw(ResourceKind::Queue, handle.as_raw()),
            Some(handle)
        );
    }

    #[test]
    fn test_from_raw_rejects_status_codes() {
        assert_eq!(ResourceHandle::from_raw(ResourceKind::Task, -3), None);
        assert_eq!(ResourceHandle::from_raw(ResourceKind::Task, 1 << 48), None);
    }

    #[test]
    fn test_task_handle_requires_task_kind() {
        let task = ResourceHandle::new(ResourceKind::Task, 3, 9);
        let mutex = ResourceHandle::new(ResourceKind::Mutex, 3, 9);

        let handle = TaskHandle::from_resource(task).unwrap();
        assert_eq!(handle.index(), 3);
        assert_eq!(handle.sequence(), 9);
        assert!(TaskHandle::from_resource(mutex).is_none());
    }

    #[test]
    fn test_handle_display() {
        let handle = ResourceHandle::new(ResourceKind::Timer, 2, 17);
        assert_eq!(handle.to_string(), "timers[2#17]");
        let task = TaskHandle::from_resource(ResourceHandle::new(ResourceKind::Task, 0, 1)).unwrap();
        assert_eq!(task.to_string(), "Task(0#1)");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ResourceKind::CountingSemaphore).unwrap();
        assert_eq!(json, "\"counting_semaphore\"");
    }
}
