//! Per-Task Error Isolation Tests
//!
//! Each task owns one error cell. These tests run real threads and check
//! that a failure recorded for one task is invisible to every other task.

use core_types::{ResourceHandle, ResourceKind, StatusCode};
use kernel_api::{HandlerAction, PeriodicDescriptor, RtError, TaskDescriptor};
use runtime::{Runtime, RuntimeConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::time::Duration;
use tests_resilience::{sim_runtime, uniform_limits};

#[test]
fn test_failure_in_one_thread_is_invisible_to_another() {
    let rt = Runtime::new(RuntimeConfig::default().with_limits(uniform_limits(8))).unwrap();
    let barrier = Arc::new(Barrier::new(2));
    let (tx, rx) = mpsc::channel();

    let failing_barrier = Arc::clone(&barrier);
    let failing_tx = tx.clone();
    rt.create_task(TaskDescriptor::new("failing"), move |ctx| {
        let bogus = ResourceHandle::new(ResourceKind::Queue, 7, 12345);
        let result = ctx.delete_object(bogus);
        failing_barrier.wait();
        failing_tx
            .send(("failing", result.is_err(), ctx.last_error().unwrap()))
            .unwrap();
    })
    .unwrap();

    rt.create_task(TaskDescriptor::new("healthy"), move |ctx| {
        // observe only after the other task has failed
        barrier.wait();
        tx.send(("healthy", false, ctx.last_error().unwrap())).unwrap();
    })
    .unwrap();

    let mut results: Vec<_> = (0..2)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    results.sort();

    assert_eq!(results[0], ("failing", true, StatusCode::INVALID_HANDLE));
    assert_eq!(results[1], ("healthy", false, StatusCode::SUCCESS));
}

#[test]
fn test_many_threads_each_see_their_own_code() {
    let rt = Runtime::new(RuntimeConfig::default().with_limits(uniform_limits(16))).unwrap();
    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let (tx, rx) = mpsc::channel();

    for i in 0..workers {
        let barrier = Arc::clone(&barrier);
        let tx = tx.clone();
        rt.create_task(TaskDescriptor::new(format!("worker-{}", i)), move |ctx| {
            let own = StatusCode(-1000 - i as i32);
            for _ in 0..200 {
                ctx.report_error(own).unwrap();
            }
            barrier.wait();
            tx.send((own, ctx.last_error().unwrap())).unwrap();
        })
        .unwrap();
    }

    for _ in 0..workers {
        let (expected, observed) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(observed, expected);
    }
}

#[test]
fn test_periodic_failure_does_not_leak_to_sibling() {
    let h = sim_runtime(4).unwrap();

    let failing = h
        .runtime
        .create_periodic_task(
            PeriodicDescriptor::new("failing", kernel_api::Duration::from_nanos(10)),
            |_| Err(StatusCode::NOT_FOUND),
            |_, _| HandlerAction::Continue,
        )
        .unwrap();
    let sibling = h
        .runtime
        .create_periodic_task(
            PeriodicDescriptor::new("sibling", kernel_api::Duration::from_nanos(10)),
            |ctx| {
                assert_eq!(ctx.last_error().unwrap(), StatusCode::SUCCESS);
                Ok(())
            },
            |_, _| HandlerAction::Continue,
        )
        .unwrap();

    for tick in [10, 20, 30] {
        assert_eq!(h.tick_at(tick), 2);
    }
    assert_eq!(h.runtime.get_error(failing).unwrap(), StatusCode::NOT_FOUND);
    assert_eq!(h.runtime.get_error(sibling).unwrap(), StatusCode::SUCCESS);
}

#[test]
fn test_reused_slot_starts_clean() {
    let h = sim_runtime(1).unwrap();

    let first = h
        .runtime
        .create_periodic_task(
            PeriodicDescriptor::new("first", kernel_api::Duration::from_nanos(10)),
            |_| Err(StatusCode::ERROR),
            |_, _| HandlerAction::Continue,
        )
        .unwrap();
    h.tick_at(10);
    assert_eq!(h.runtime.get_error(first).unwrap(), StatusCode::ERROR);
    h.runtime.delete_task(first).unwrap();

    let second = h
        .runtime
        .create_task(TaskDescriptor::new("second"), |_| {})
        .unwrap();
    assert_eq!(first.index(), second.index());
    assert_eq!(h.runtime.get_error(second).unwrap(), StatusCode::SUCCESS);
    assert!(matches!(
        h.runtime.get_error(first),
        Err(RtError::InvalidHandle(_))
    ));
}

#[test]
fn test_error_names_for_diagnostics() {
    let h = sim_runtime(1).unwrap();
    h.runtime.create_object(ResourceKind::Mutex, "m").unwrap();
    let err = h.runtime.create_object(ResourceKind::Mutex, "m2").unwrap_err();

    assert_eq!(err.status().name(), "RESOURCE_EXHAUSTED");
    assert_eq!(StatusCode(-4).name(), "INVALID_HANDLE");
    assert_eq!(StatusCode(-12345).name(), "UNKNOWN_ERROR");
    assert_eq!(StatusCode::SUCCESS.name(), "SUCCESS");
}

#[test]
fn test_deleted_task_cannot_write_into_slot_successor() {
    let h = sim_runtime(1).unwrap();
    let started = Arc::new(AtomicBool::new(false));
    let stop = Arc::new(AtomicBool::new(false));
    let rejected = Arc::new(AtomicUsize::new(0));

    let (started_in, stop_in, rejected_in) =
        (Arc::clone(&started), Arc::clone(&stop), Arc::clone(&rejected));
    let old = h
        .runtime
        .create_task(TaskDescriptor::new("stale"), move |ctx| {
            started_in.store(true, Ordering::SeqCst);
            loop {
                if ctx.report_error(StatusCode::ERROR).is_err() {
                    rejected_in.fetch_add(1, Ordering::SeqCst);
                }
                if stop_in.load(Ordering::SeqCst) {
                    break;
                }
            }
        })
        .unwrap();
    h.runtime.delete_task(old).unwrap();

    // the deleted task's entry keeps running on its own thread
    let backend = h.backend.clone();
    let runner = std::thread::spawn(move || backend.run_pending());
    while !started.load(Ordering::SeqCst) {
        std::thread::yield_now();
    }

    for round in 0..2000 {
        let successor = h
            .runtime
            .create_periodic_task(
                PeriodicDescriptor::new("successor", kernel_api::Duration::from_nanos(10)),
                |_| Ok(()),
                |_, _| HandlerAction::Continue,
            )
            .unwrap();
        assert_eq!(successor.index(), old.index());
        assert_eq!(
            h.runtime.get_error(successor).unwrap(),
            StatusCode::SUCCESS,
            "round {}",
            round
        );
        h.runtime.delete_task(successor).unwrap();
    }

    stop.store(true, Ordering::SeqCst);
    assert_eq!(runner.join().unwrap(), 1);
    assert!(rejected.load(Ordering::SeqCst) > 0);
    assert_eq!(h.runtime.stats(ResourceKind::Task).current, 0);
}
