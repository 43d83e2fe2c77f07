// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two would-be writers and two readers share a counter.
//!
//! The first writer wins and increments. The second is demoted: it waits for
//! the first to finish and prints the value it left. The readers print
//! whatever they see once no writer is active.
//!
//! ```text
//! cargo run --example shared_counter
//! ```

use rdmutex::RDMutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

struct SharedCounter {
    count: AtomicUsize,
    lock: RDMutex,
}

impl SharedCounter {
    fn new() -> Self {
        SharedCounter {
            count: AtomicUsize::new(0),
            lock: RDMutex::new(),
        }
    }

    fn update(&self, id: usize) {
        if self.lock.try_acquire_writer_sync() {
            println!("thread {id}: acquired as writer, incrementing");
            self.count.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(500));
            if let Err(e) = self.lock.release_writer() {
                println!("thread {id}: {e}");
            }
        } else {
            println!("thread {id}: demoted to reader, waiting for the writer");
            self.lock.wait_for_writer_sync();
            println!(
                "thread {id}: read counter = {}",
                self.count.load(Ordering::Relaxed)
            );
            if let Err(e) = self.lock.release_reader() {
                println!("thread {id}: {e}");
            }
        }
    }

    fn read(&self, id: usize) {
        self.lock.acquire_reader_sync();
        println!(
            "thread {id}: reading, counter = {}",
            self.count.load(Ordering::Relaxed)
        );
        thread::sleep(Duration::from_millis(50));
        if let Err(e) = self.lock.release_reader() {
            println!("thread {id}: {e}");
        }
    }
}

fn main() {
    let shared = Arc::new(SharedCounter::new());
    let mut handles = Vec::new();

    let first = Arc::clone(&shared);
    handles.push(thread::spawn(move || first.update(1)));

    thread::sleep(Duration::from_millis(50));

    let second = Arc::clone(&shared);
    handles.push(thread::spawn(move || second.update(2)));

    for id in 3..5 {
        let reader = Arc::clone(&shared);
        handles.push(thread::spawn(move || reader.read(id)));
    }

    for handle in handles {
        handle.join().expect("worker panicked");
    }
    println!("final counter = {}", shared.count.load(Ordering::Relaxed));
}
