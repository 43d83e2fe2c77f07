// SPDX-License-Identifier: MIT OR Apache-2.0
//! Records of callers suspended on one of the lock's wait points.

use std::thread::Thread;

/// A suspended caller, as stored under the gate.
#[derive(Debug)]
pub(crate) enum Waiter {
    /// A parked OS thread.
    Thread(Thread),
    /// An async task awaiting a continuation.
    Task(r#continue::Sender<()>),
}

impl Waiter {
    pub(crate) fn current_thread() -> Self {
        Waiter::Thread(std::thread::current())
    }

    /// Creates a waiter for an async task along with the future it should await.
    pub(crate) fn task() -> (Self, impl Future<Output = ()>) {
        let (sender, receiver) = r#continue::continuation();
        (Waiter::Task(sender), receiver)
    }

    /// Wakes the waiter. Must be called after the gate has been left.
    pub(crate) fn wake(self) {
        match self {
            Waiter::Thread(thread) => thread.unpark(),
            Waiter::Task(sender) => sender.send(()),
        }
    }
}

/// Wakes every waiter in `waiters`.
pub(crate) fn wake_all(waiters: Vec<Waiter>) {
    for waiter in waiters {
        waiter.wake();
    }
}
