// SPDX-License-Identifier: MIT OR Apache-2.0
//! A reader/writer lock that turns writer/writer contention into reader/writer contention.
//!
//! [`RDMutex`] hands the writer role to the first caller that asks for it.
//! Everyone who asks while that writer is active is *demoted*. They are counted
//! as readers and told so immediately, instead of queuing to write after it.
//! They then wait for the writer to finish and read what it produced.
//!
//! ```
//! use rdmutex::RDMutex;
//!
//! let mutex = RDMutex::new();
//! if mutex.try_acquire_writer_sync() {
//!     // exclusive section
//!     mutex.release_writer().unwrap();
//! } else {
//!     mutex.wait_for_writer_sync();
//!     // read the value the writer left behind
//!     mutex.release_reader().unwrap();
//! }
//! ```
//!
//! `RDMutex` works on native targets and on wasm32. There the `_sync`
//! operations fall back to spinning on threads that may not block, and the
//! `_async` operations never block at all.
//!
//! Diagnostics go through the [`log`] facade; no logger is installed here.

mod capability;
mod error;
mod gate;
pub mod rdmutex;
mod waiter;
#[cfg(target_arch = "wasm32")]
mod wasm_support;

#[cfg(test)]
mod sync_tests;

pub use capability::DemotingLock;
pub use error::{InvalidRelease, Role};
pub use rdmutex::{RDMutex, Snapshot};
