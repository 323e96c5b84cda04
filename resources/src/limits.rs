//! Configured table capacities

use crate::table::MAX_TABLE_CAPACITY;
use core_types::ResourceKind;
use kernel_api::{RtError, RtResult};
use serde::{Deserialize, Serialize};

/// Fixed capacity of every resource table
///
/// Supplied by the configuration loader; read-only once the runtime is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    pub max_tasks: usize,
    pub max_counting_semaphores: usize,
    pub max_binary_semaphores: usize,
    pub max_mutexes: usize,
    pub max_queues: usize,
    pub max_timers: usize,
    pub max_pools: usize,
}

impl ResourceLimits {
    /// Capacity configured for `kind`
    pub fn capacity(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Task => self.max_tasks,
            ResourceKind::CountingSemaphore => self.max_counting_semaphores,
            ResourceKind::BinarySemaphore => self.max_binary_semaphores,
            ResourceKind::Mutex => self.max_mutexes,
            ResourceKind::Queue => self.max_queues,
            ResourceKind::Timer => self.max_timers,
            ResourceKind::MemoryPool => self.max_pools,
        }
    }

    /// Builder: sets the capacity of one kind
    pub fn with_capacity(mut self, kind: ResourceKind, capacity: usize) -> Self {
        let slot = match kind {
            ResourceKind::Task => &mut self.max_tasks,
            ResourceKind::CountingSemaphore => &mut self.max_counting_semaphores,
            ResourceKind::BinarySemaphore => &mut self.max_binary_semaphores,
            ResourceKind::Mutex => &mut self.max_mutexes,
            ResourceKind::Queue => &mut self.max_queues,
            ResourceKind::Timer => &mut self.max_timers,
            ResourceKind::MemoryPool => &mut self.max_pools,
        };
        *slot = capacity;
        self
    }

    /// Rejects zero capacities and capacities beyond the handle index range
    pub fn validate(&self) -> RtResult<()> {
        for kind in ResourceKind::ALL {
            let capacity = self.capacity(kind);
            if capacity == 0 {
                return Err(RtError::InvalidParameter("resource capacity must be non-zero"));
            }
            if capacity > MAX_TABLE_CAPACITY {
                return Err(RtError::InvalidParameter("resource capacity exceeds handle range"));
            }
        }
        Ok(())
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_tasks: 64,
            max_counting_semaphores: 20,
            max_binary_semaphores: 20,
            max_mutexes: 20,
            max_queues: 64,
            max_timers: 5,
            max_pools: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let limits = ResourceLimits::default();
        assert!(limits.validate().is_ok());
        assert_eq!(limits.capacity(ResourceKind::Task), 64);
        assert_eq!(limits.capacity(ResourceKind::Timer), 5);
    }

    #[test]
    fn test_builder_sets_each_kind() {
        let mut limits = ResourceLimits::default();
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            limits = limits.with_capacity(*kind, 100 + i);
        }
        for (i, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(limits.capacity(*kind), 100 + i);
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let limits = ResourceLimits::default().with_capacity(ResourceKind::Mutex, 0);
        assert!(matches!(limits.validate(), Err(RtError::InvalidParameter(_))));
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let limits =
            ResourceLimits::default().with_capacity(ResourceKind::Queue, MAX_TABLE_CAPACITY + 1);
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let limits: ResourceLimits = serde_json::from_str(r#"{"max_tasks": 8}"#).unwrap();
        assert_eq!(limits.max_tasks, 8);
        assert_eq!(limits.max_queues, ResourceLimits::default().max_queues);
    }
}
