//! Lock-protected resource table shared between tasks

use crate::stats::ResourceStats;
use crate::table::ResourceTable;
use core_types::{ResourceHandle, ResourceKind};
use kernel_api::{RtError, RtResult};
use parking_lot::Mutex;

/// A [`ResourceTable`] behind a mutex
///
/// Occupancy and counters change in one critical section, so concurrent
/// creators never receive the same slot and readers never observe a
/// half-updated table.
#[derive(Debug)]
pub struct ResourcePool<T> {
    kind: ResourceKind,
    capacity: usize,
    table: Mutex<ResourceTable<T>>,
}

impl<T> ResourcePool<T> {
    pub fn new(kind: ResourceKind, capacity: usize) -> RtResult<Self> {
        let table = ResourceTable::new(kind, capacity)?;
        Ok(Self {
            kind,
            capacity,
            table: Mutex::new(table),
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn create(&self, payload: T) -> RtResult<ResourceHandle> {
        let result = self.table.lock().create(payload);
        match &result {
            Ok(handle) => log::debug!("created {}", handle),
            Err(_) => log::warn!(
                "{} table exhausted ({} slots)",
                self.kind.label(),
                self.capacity
            ),
        }
        result
    }

    pub fn delete(&self, handle: ResourceHandle) -> RtResult<T> {
        let result = self.table.lock().delete(handle);
        match &result {
            Ok(_) => log::debug!("deleted {}", handle),
            Err(_) => log::warn!("rejected delete of {}", handle),
        }
        result
    }

    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.table.lock().contains(handle)
    }

    /// Runs `f` on the payload named by `handle` while holding the lock
    pub fn with_entry<R>(&self, handle: ResourceHandle, f: impl FnOnce(&T) -> R) -> RtResult<R> {
        let table = self.table.lock();
        table.get(handle).map(f)
    }

    /// Runs `f` on the mutable payload named by `handle` while holding the lock
    pub fn with_entry_mut<R>(
        &self,
        handle: ResourceHandle,
        f: impl FnOnce(&mut T) -> R,
    ) -> RtResult<R> {
        let mut table = self.table.lock();
        table.get_mut(handle).map(f)
    }

    /// Finds the first live resource whose payload matches `predicate`
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> RtResult<ResourceHandle> {
        let table = self.table.lock();
        let found = table
            .iter()
            .find(|(_, payload)| predicate(payload))
            .map(|(handle, _)| handle);
        found.ok_or_else(|| RtError::NotFound(format!("no matching {}", self.kind.label())))
    }

    pub fn handles(&self) -> Vec<ResourceHandle> {
        self.table.lock().handles()
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ResourceStats {
        self.table.lock().stats()
    }
}

impl<T: Clone> ResourcePool<T> {
    /// Copies the payload named by `handle`
    pub fn get_cloned(&self, handle: ResourceHandle) -> RtResult<T> {
        self.with_entry(handle, T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_create_and_lookup() {
        let pool = ResourcePool::new(ResourceKind::BinarySemaphore, 2).unwrap();
        let h = pool.create(String::from("sem")).unwrap();
        assert_eq!(pool.get_cloned(h).unwrap(), "sem");
        assert_eq!(pool.with_entry(h, |s| s.len()).unwrap(), 3);
        assert!(pool.contains(h));
    }

    #[test]
    fn test_with_entry_mut() {
        let pool = ResourcePool::new(ResourceKind::CountingSemaphore, 1).unwrap();
        let h = pool.create(0u32).unwrap();
        pool.with_entry_mut(h, |count| *count += 5).unwrap();
        assert_eq!(pool.get_cloned(h).unwrap(), 5);
    }

    #[test]
    fn test_find() {
        let pool = ResourcePool::new(ResourceKind::Task, 4).unwrap();
        pool.create("alpha").unwrap();
        let beta = pool.create("beta").unwrap();
        assert_eq!(pool.find(|name| *name == "beta").unwrap(), beta);
        assert!(matches!(
            pool.find(|name| *name == "gamma"),
            Err(RtError::NotFound(_))
        ));
    }

    #[test]
    fn test_stale_handle_rejected_by_accessors() {
        let pool = ResourcePool::new(ResourceKind::MemoryPool, 1).unwrap();
        let h = pool.create(1u8).unwrap();
        pool.delete(h).unwrap();
        assert_eq!(pool.with_entry(h, |_| ()), Err(RtError::InvalidHandle(h)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_concurrent_creates_get_distinct_slots() {
        let pool = Arc::new(ResourcePool::new(ResourceKind::Task, 32).unwrap());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || (0..4).map(|_| pool.create(()).unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for worker in workers {
            for handle in worker.join().unwrap() {
                assert!(seen.insert(handle.index()));
            }
        }

        assert_eq!(seen.len(), 32);
        assert!(pool.create(()).is_err());
        assert_eq!(pool.stats().current, 32);
    }

    #[test]
    fn test_concurrent_churn_keeps_counters_consistent() {
        let pool = Arc::new(ResourcePool::new(ResourceKind::Mutex, 4).unwrap());

        let workers: Vec<_> = (0..6)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if let Ok(h) = pool.create(()) {
                            pool.delete(h).unwrap();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let stats = pool.stats();
        assert!(stats.is_consistent());
        assert_eq!(stats.current, 0);
        assert_eq!(stats.created, stats.deleted);
    }
}
