// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-thread tests for the rdmutex crate.

use crate::{RDMutex, Snapshot};
use r#continue::continuation;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[test]
fn test_demoted_writer_waits_for_active_writer() {
    let mutex = Arc::new(RDMutex::new());
    let value = Arc::new(AtomicUsize::new(0));
    assert!(mutex.try_acquire_writer_sync());

    let (tx, rx) = mpsc::channel();
    let (m, v) = (Arc::clone(&mutex), Arc::clone(&value));
    let handle = thread::spawn(move || {
        let won = m.try_acquire_writer_sync();
        tx.send("tried").unwrap();
        m.wait_for_writer_sync();
        let seen = v.load(Ordering::Relaxed);
        tx.send("waited").unwrap();
        (won, seen, m.release_reader())
    });

    assert_eq!(rx.recv().unwrap(), "tried");
    // Still parked behind the writer.
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    value.store(1, Ordering::Relaxed);
    mutex.release_writer().unwrap();
    assert_eq!(rx.recv().unwrap(), "waited");

    let (won, seen, released) = handle.join().unwrap();
    assert!(!won);
    assert_eq!(seen, 1);
    assert_eq!(released, Ok(()));
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_contending_writers_are_all_demoted() {
    const CONTENDERS: usize = 5;

    let mutex = Arc::new(RDMutex::new());
    let original_active = Arc::new(AtomicBool::new(true));
    assert!(mutex.try_acquire_writer_sync());

    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let mutex = Arc::clone(&mutex);
            let original_active = Arc::clone(&original_active);
            let tx = tx.clone();
            thread::spawn(move || {
                let won = mutex.try_acquire_writer_sync();
                tx.send(won).unwrap();
                if won {
                    mutex.release_writer().unwrap();
                    return true;
                }
                mutex.wait_for_writer_sync();
                let original_done = !original_active.load(Ordering::Acquire);
                mutex.release_reader().unwrap();
                original_done
            })
        })
        .collect();

    let results: Vec<bool> = (0..CONTENDERS).map(|_| rx.recv().unwrap()).collect();
    assert!(results.iter().all(|won| !won));
    assert_eq!(
        mutex.snapshot(),
        Snapshot {
            writer_active: true,
            reader_count: CONTENDERS,
        }
    );

    original_active.store(false, Ordering::Release);
    mutex.release_writer().unwrap();

    for handle in handles {
        assert!(handle.join().unwrap(), "observed the writer still active");
    }
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_writers_are_mutually_exclusive() {
    let mutex = Arc::new(RDMutex::new());
    let writing = Arc::new(AtomicBool::new(false));
    let readers_inside = Arc::new(AtomicUsize::new(0));
    let writes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let mutex = Arc::clone(&mutex);
            let writing = Arc::clone(&writing);
            let readers_inside = Arc::clone(&readers_inside);
            let writes = Arc::clone(&writes);
            thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        mutex
                            .update_sync(
                                || {
                                    assert!(!writing.swap(true, Ordering::AcqRel));
                                    assert_eq!(readers_inside.load(Ordering::Acquire), 0);
                                    writes.fetch_add(1, Ordering::Relaxed);
                                    writing.store(false, Ordering::Release);
                                },
                                || assert!(!writing.load(Ordering::Acquire)),
                            )
                            .unwrap();
                    } else {
                        mutex
                            .read_sync(|| {
                                readers_inside.fetch_add(1, Ordering::AcqRel);
                                assert!(!writing.load(Ordering::Acquire));
                                readers_inside.fetch_sub(1, Ordering::AcqRel);
                            })
                            .unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(writes.load(Ordering::Relaxed) >= 1);
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_writer_does_not_proceed_while_readers_counted() {
    let mutex = Arc::new(RDMutex::new());
    let readers_inside = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        mutex.acquire_reader_sync();
        readers_inside.fetch_add(1, Ordering::AcqRel);
    }

    let (tx, rx) = mpsc::channel();
    let (m, inside) = (Arc::clone(&mutex), Arc::clone(&readers_inside));
    let handle = thread::spawn(move || {
        assert!(m.try_acquire_writer_sync());
        tx.send(inside.load(Ordering::Acquire)).unwrap();
        m.release_writer().unwrap();
    });

    for _ in 0..3 {
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
        readers_inside.fetch_sub(1, Ordering::AcqRel);
        mutex.release_reader().unwrap();
    }
    assert_eq!(rx.recv().unwrap(), 0);
    handle.join().unwrap();
}

#[test]
fn test_release_wakes_every_waiter() {
    let mutex = Arc::new(RDMutex::new());
    assert!(mutex.try_acquire_writer_sync());

    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mutex = Arc::clone(&mutex);
            let tx = tx.clone();
            thread::spawn(move || {
                if i % 2 == 0 {
                    // Demoted callers.
                    assert!(!mutex.try_acquire_writer_sync());
                    mutex.wait_for_writer_sync();
                    tx.send(()).unwrap();
                    mutex.release_reader().unwrap();
                } else {
                    // Explicit readers.
                    mutex.acquire_reader_sync();
                    tx.send(()).unwrap();
                    mutex.release_reader().unwrap();
                }
            })
        })
        .collect();

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    mutex.release_writer().unwrap();
    for _ in 0..4 {
        rx.recv_timeout(Duration::from_secs(5))
            .expect("waiter was not woken by release_writer");
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_wait_returns_when_next_writer_already_claimed() {
    let mutex = Arc::new(RDMutex::new());
    assert!(mutex.try_acquire_writer_sync());

    let (tx, rx) = mpsc::channel();
    let m = Arc::clone(&mutex);
    let observer = thread::spawn(move || {
        assert!(!m.try_acquire_writer_sync());
        tx.send(()).unwrap();
        m.wait_for_writer_sync();
        m.release_reader().unwrap();
    });
    rx.recv().unwrap();
    // Give the observer time to park.
    thread::sleep(Duration::from_millis(20));

    // Release and immediately claim again: the new writer drains on the
    // observer, which must still get out of its wait.
    let next = Arc::clone(&mutex);
    mutex.release_writer().unwrap();
    let writer = thread::spawn(move || {
        let won = next.try_acquire_writer_sync();
        next.release_writer().unwrap();
        won
    });

    observer.join().unwrap();
    assert!(writer.join().unwrap());
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

/// Demoted callers keep incrementing the reader count while a writer drains,
/// so the drain lasts as long as they keep arriving.
#[test]
fn test_demotions_during_drain_extend_it() {
    let mutex = Arc::new(RDMutex::new());
    mutex.acquire_reader_sync();

    let (tx, rx) = mpsc::channel();
    let writer = Arc::clone(&mutex);
    let handle = thread::spawn(move || {
        assert!(writer.try_acquire_writer_sync());
        tx.send(()).unwrap();
        writer.release_writer().unwrap();
    });

    // Wait until the writer has claimed and is draining.
    while !mutex.snapshot().writer_active {
        thread::yield_now();
    }

    // Each contender is demoted and joins the drain.
    for expected in 2..=4 {
        assert!(!mutex.try_acquire_writer_sync());
        assert_eq!(mutex.snapshot().reader_count, expected);
    }

    // Releasing the original reader is not enough.
    mutex.release_reader().unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    // Neither is releasing all but one of the demoted readers.
    mutex.release_reader().unwrap();
    mutex.release_reader().unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    // Demoted mid-drain, these callers must release before waiting.
    mutex.release_reader().unwrap();
    rx.recv().unwrap();
    mutex.wait_for_writer_sync();
    handle.join().unwrap();
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_update_demoted_during_drain_does_not_deadlock() {
    let mutex = Arc::new(RDMutex::new());
    mutex.acquire_reader_sync();

    let writer = Arc::clone(&mutex);
    let writer_handle = thread::spawn(move || writer.update_sync(|| "wrote", || "observed"));
    while !mutex.snapshot().writer_active {
        thread::yield_now();
    }

    let late = Arc::clone(&mutex);
    let late_handle = thread::spawn(move || late.update_sync(|| "wrote", || "observed"));
    thread::sleep(Duration::from_millis(20));

    mutex.release_reader().unwrap();
    assert_eq!(writer_handle.join().unwrap(), Ok("wrote"));
    // Normally "observed"; a late thread that only reached the lock after the
    // writer finished becomes a writer itself.
    let late = late_handle.join().unwrap();
    assert!(matches!(late, Ok("observed" | "wrote")), "{late:?}");
    assert_eq!(mutex.snapshot(), Snapshot::default());
}

#[test]
fn test_async_demoted_waiter_across_threads() {
    test_executors::spin_on(async {
        let mutex = Arc::new(RDMutex::new());
        assert!(mutex.try_acquire_writer_async().await);

        let (up, up_r) = continuation();
        let (done, done_r) = continuation();
        let m = Arc::clone(&mutex);
        thread::spawn(move || {
            test_executors::spin_on(async {
                let won = m.try_acquire_writer_async().await;
                up.send(won);
                m.wait_for_writer_async().await;
                done.send(m.release_reader());
            })
        });

        assert!(!up_r.await);
        mutex.release_writer().unwrap();
        assert_eq!(done_r.await, Ok(()));
        assert_eq!(mutex.snapshot(), Snapshot::default());
    });
}

#[test]
fn test_async_reader_waits_for_writer() {
    let mutex = Arc::new(RDMutex::new());
    assert!(mutex.try_acquire_writer_sync());

    let (c, r) = continuation();
    let m = Arc::clone(&mutex);
    let handle = thread::spawn(move || {
        test_executors::spin_on(async {
            m.acquire_reader_async().await;
            c.send(m.snapshot());
            m.release_reader().unwrap();
        })
    });

    thread::sleep(Duration::from_millis(20));
    assert!(!handle.is_finished());
    mutex.release_writer().unwrap();

    let seen = test_executors::spin_on(r);
    assert_eq!(
        seen,
        Snapshot {
            writer_active: false,
            reader_count: 1,
        }
    );
    handle.join().unwrap();
}
