// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reader/writer lock whose writers never queue behind each other.
//!
//! # The Policy
//!
//! An ordinary reader/writer lock makes a second writer wait until the first
//! one is done, and then lets it write too. [`RDMutex`] does something else: a
//! writer attempt that finds another writer active is **demoted** on the spot.
//! It is counted as a reader, told so with `false`, and is expected to wait for
//! the active writer and then read what it wrote.
//!
//! This suits "whoever gets there first refreshes it, everyone else uses the
//! fresh value" workloads: a cache fill, a lazily recomputed snapshot, a shared
//! counter bumped by whichever task arrives first.
//!
//! # Life of a Writer Attempt
//!
//! 1. No writer active: the caller becomes the writer. If readers are still
//!    counted it *drains*, waiting until the last of them releases. Then it
//!    gets `true` and owns the resource until
//!    [`release_writer`](RDMutex::release_writer).
//! 2. A writer is active: the caller is counted as a reader and gets `false`.
//!    It calls `wait_for_writer_*`, reads, then
//!    [`release_reader`](RDMutex::release_reader).
//!
//! Explicit readers (`acquire_reader_*`) are never demoted; they wait for any
//! active writer and are then counted.
//!
//! Releasing a role that is not held is reported as
//! [`InvalidRelease`](crate::InvalidRelease) and changes nothing.
//!
//! # Examples
//!
//! ## Writers Racing for One Update
//!
//! ```
//! # // std::thread::spawn panics on wasm32
//! # if cfg!(target_arch = "wasm32") { return; }
//! use rdmutex::RDMutex;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::thread;
//!
//! let mutex = Arc::new(RDMutex::new());
//! let counter = Arc::new(AtomicU32::new(0));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|_| {
//!         let (mutex, counter) = (Arc::clone(&mutex), Arc::clone(&counter));
//!         thread::spawn(move || {
//!             mutex
//!                 .update_sync(
//!                     || counter.fetch_add(1, Ordering::Relaxed) + 1,
//!                     || counter.load(Ordering::Relaxed),
//!                 )
//!                 .unwrap()
//!         })
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     // Every caller saw at least one completed update.
//!     assert!(handle.join().unwrap() >= 1);
//! }
//! assert_eq!(mutex.snapshot().reader_count, 0);
//! ```
//!
//! ## Async Usage
//!
//! ```
//! # test_executors::spin_on(async {
//! use rdmutex::RDMutex;
//!
//! let mutex = RDMutex::new();
//! if mutex.try_acquire_writer_async().await {
//!     mutex.release_writer().unwrap();
//! }
//! let n = mutex.read_async(|| 3).await.unwrap();
//! assert_eq!(n, 3);
//! # });
//! ```

mod inner;
mod reader;
mod wait;
mod with;
mod writer;


pub use inner::{RDMutex, Snapshot};
