//! Per-task error cells
//!
//! One cell per task slot. A cell is armed with the owning task's sequence
//! number at creation, so a handle from an earlier occupant of the slot
//! never reads or writes the new task's code.

use core_types::{StatusCode, TaskHandle};
use kernel_api::{RtError, RtResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence value of a disarmed cell; the registry never issues it
const DISARMED: u32 = 0;

/// Owner sequence in the high half, status code in the low half
///
/// Ownership and code change in one atomic step, so a writer whose
/// sequence check passed can never land in a re-armed cell.
#[derive(Debug)]
struct ErrorCell(AtomicU64);

fn pack(sequence: u32, code: StatusCode) -> u64 {
    (u64::from(sequence) << 32) | u64::from(code.code() as u32)
}

fn sequence_of(word: u64) -> u32 {
    (word >> 32) as u32
}

fn code_of(word: u64) -> StatusCode {
    StatusCode(word as u32 as i32)
}

impl ErrorCell {
    /// Applies `update` while the cell still belongs to `sequence`
    fn update_owned(&self, sequence: u32, update: impl Fn(u64) -> u64) -> Result<u64, u64> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                (sequence_of(word) == sequence).then(|| update(word))
            })
    }
}

/// Fixed array of error cells indexed by task slot
#[derive(Debug)]
pub struct ErrorCells {
    cells: Vec<ErrorCell>,
}

impl ErrorCells {
    pub fn new(capacity: usize) -> Self {
        let cells = (0..capacity)
            .map(|_| ErrorCell(AtomicU64::new(pack(DISARMED, StatusCode::SUCCESS))))
            .collect();
        Self { cells }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Binds the cell to `task` and resets it to success
    pub(crate) fn arm(&self, task: TaskHandle) -> RtResult<()> {
        let cell = self.slot(task)?;
        cell.0
            .store(pack(task.sequence(), StatusCode::SUCCESS), Ordering::Release);
        Ok(())
    }

    /// Unbinds the cell; later reads through `task` fail
    pub(crate) fn disarm(&self, task: TaskHandle) {
        if let Some(cell) = self.cells.get(task.index() as usize) {
            let _ = cell.update_owned(task.sequence(), |_| {
                pack(DISARMED, StatusCode::SUCCESS)
            });
        }
    }

    /// Records `code` as the task's most recent failure
    ///
    /// Only the runtime calls this, on behalf of `task` itself.
    pub(crate) fn set(&self, task: TaskHandle, code: StatusCode) -> RtResult<()> {
        let sequence = task.sequence();
        self.slot(task)?
            .update_owned(sequence, |_| pack(sequence, code))
            .map(|_| ())
            .map_err(|_| RtError::InvalidHandle(task.resource()))
    }

    /// Most recent failure of `task`, or `SUCCESS`
    pub fn get(&self, task: TaskHandle) -> RtResult<StatusCode> {
        let word = self.slot(task)?.0.load(Ordering::Acquire);
        if sequence_of(word) != task.sequence() {
            return Err(RtError::InvalidHandle(task.resource()));
        }
        Ok(code_of(word))
    }

    pub(crate) fn clear(&self, task: TaskHandle) -> RtResult<()> {
        self.set(task, StatusCode::SUCCESS)
    }

    fn slot(&self, task: TaskHandle) -> RtResult<&ErrorCell> {
        self.cells
            .get(task.index() as usize)
            .ok_or(RtError::InvalidHandle(task.resource()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ResourceHandle, ResourceKind};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    fn task(index: u16, sequence: u32) -> TaskHandle {
        TaskHandle::from_resource(ResourceHandle::new(ResourceKind::Task, index, sequence)).unwrap()
    }

    #[test]
    fn test_armed_cell_reads_success() {
        let cells = ErrorCells::new(4);
        let t = task(1, 7);
        cells.arm(t).unwrap();
        assert_eq!(cells.get(t).unwrap(), StatusCode::SUCCESS);
    }

    #[test]
    fn test_unarmed_cell_is_invalid_handle() {
        let cells = ErrorCells::new(4);
        assert!(matches!(cells.get(task(0, 1)), Err(RtError::InvalidHandle(_))));
        assert!(cells.set(task(0, 1), StatusCode::ERROR).is_err());
    }

    #[test]
    fn test_set_get_clear() {
        let cells = ErrorCells::new(2);
        let t = task(0, 3);
        cells.arm(t).unwrap();
        cells.set(t, StatusCode::NOT_FOUND).unwrap();
        assert_eq!(cells.get(t).unwrap(), StatusCode::NOT_FOUND);
        cells.clear(t).unwrap();
        assert_eq!(cells.get(t).unwrap(), StatusCode::SUCCESS);
    }

    #[test]
    fn test_stale_handle_cannot_touch_new_owner() {
        let cells = ErrorCells::new(1);
        let old = task(0, 1);
        cells.arm(old).unwrap();
        cells.disarm(old);

        let new = task(0, 2);
        cells.arm(new).unwrap();
        assert!(cells.set(old, StatusCode::ERROR).is_err());
        assert_eq!(cells.get(new).unwrap(), StatusCode::SUCCESS);
    }

    #[test]
    fn test_stale_disarm_is_ignored() {
        let cells = ErrorCells::new(1);
        cells.arm(task(0, 2)).unwrap();
        cells.disarm(task(0, 1));
        assert!(cells.get(task(0, 2)).is_ok());
    }

    #[test]
    fn test_out_of_range_index() {
        let cells = ErrorCells::new(2);
        assert!(cells.arm(task(5, 1)).is_err());
    }

    #[test]
    fn test_cells_are_isolated_between_threads() {
        let cells = Arc::new(ErrorCells::new(8));
        let tasks: Vec<_> = (0..8).map(|i| task(i, 100 + i as u32)).collect();
        for t in &tasks {
            cells.arm(*t).unwrap();
        }

        let workers: Vec<_> = tasks
            .iter()
            .map(|t| {
                let cells = Arc::clone(&cells);
                let t = *t;
                thread::spawn(move || {
                    let own = StatusCode(-100 - t.index() as i32);
                    for _ in 0..1000 {
                        cells.set(t, own).unwrap();
                        assert_eq!(cells.get(t).unwrap(), own);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        for t in &tasks {
            assert_eq!(cells.get(*t).unwrap(), StatusCode(-100 - t.index() as i32));
        }
    }

    #[test]
    fn test_negative_codes_survive_packing() {
        let cells = ErrorCells::new(1);
        let t = task(0, u32::MAX);
        cells.arm(t).unwrap();
        cells.set(t, StatusCode(i32::MIN)).unwrap();
        assert_eq!(cells.get(t).unwrap(), StatusCode(i32::MIN));
    }

    #[test]
    fn test_stale_writer_never_lands_in_rearmed_cell() {
        let cells = Arc::new(ErrorCells::new(1));
        let stale = task(0, 1);
        cells.arm(stale).unwrap();
        cells.disarm(stale);

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let cells = Arc::clone(&cells);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut rejected = 0u64;
                loop {
                    if cells.set(stale, StatusCode::ERROR).is_err() {
                        rejected += 1;
                    }
                    if done.load(Ordering::Acquire) {
                        break;
                    }
                }
                rejected
            })
        };

        for sequence in 2..20_000u32 {
            let owner = task(0, sequence);
            cells.arm(owner).unwrap();
            assert_eq!(cells.get(owner).unwrap(), StatusCode::SUCCESS, "seq {}", sequence);
            cells.disarm(owner);
        }
        done.store(true, Ordering::Release);

        assert!(writer.join().unwrap() > 0);
        assert!(cells.get(stale).is_err());
    }
}
