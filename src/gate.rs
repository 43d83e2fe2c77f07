// SPDX-License-Identifier: MIT OR Apache-2.0
//! The exclusive gate that serializes all bookkeeping inside [`RDMutex`](crate::RDMutex).
//!
//! Critical sections under the gate are a handful of field reads and writes plus
//! pushing or taking a waiter record, so spinning is cheaper than parking here.
//! Waiting for a *state change* never happens while the gate is held: callers
//! register a waiter, leave the gate, and only then park or await.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// A spinlock that only hands out access through a closure.
///
/// Because the closure is the only way in, the gate can never be held across a
/// park, an `.await`, or any other suspension point.
#[derive(Debug)]
pub(crate) struct Gate<T> {
    data: UnsafeCell<T>,
    locked: AtomicBool,
}

impl<T> Gate<T> {
    pub(crate) const fn new(data: T) -> Self {
        Gate {
            data: UnsafeCell::new(data),
            locked: AtomicBool::new(false),
        }
    }

    /// Runs `f` with exclusive access to the guarded value.
    ///
    /// The gate is released when `f` returns, including by unwinding.
    pub(crate) fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.locked.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }

        let _open = Open(&self.locked);
        // SAFETY: `locked` was flipped from false to true by us, so no other
        // caller can be inside `with_mut` until `_open` drops.
        unsafe { f(&mut *self.data.get()) }
    }
}

/// Reopens the gate on scope exit.
struct Open<'a>(&'a AtomicBool);

impl Drop for Open<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

unsafe impl<T: Send> Send for Gate<T> {}
unsafe impl<T: Send> Sync for Gate<T> {}
