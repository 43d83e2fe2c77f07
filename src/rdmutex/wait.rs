// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::RDMutex;
use crate::waiter::Waiter;

#[cfg(target_arch = "wasm32")]
use crate::wasm_support::atomics_wait_supported;

impl RDMutex {
    /// Parks the thread until the writer active at the time of the call has released.
    ///
    /// Meant for a caller that was demoted by `try_acquire_writer_*`: it lets
    /// the active writer finish before the caller reads the settled value. The
    /// reader count is not touched; the demoted caller still has to call
    /// [`release_reader`](Self::release_reader) afterwards.
    ///
    /// Returns immediately if no writer is active. If another writer claims the
    /// lock between the release and this thread waking up, the call still
    /// returns: the writer it was waiting for is done, and the new writer may
    /// itself be draining on this caller's reader role.
    ///
    /// # Platform Behavior
    ///
    /// - **Native**: Uses thread parking for efficient blocking
    /// - **WASM with `Atomics.wait`**: Blocks using `Atomics.wait`
    /// - **WASM without `Atomics.wait`**: **Will panic** - use [`wait_for_writer_sync`](Self::wait_for_writer_sync) instead
    ///
    /// # Examples
    ///
    /// ```
    /// # // std::thread::spawn panics on wasm32
    /// # if cfg!(target_arch = "wasm32") { return; }
    /// use rdmutex::RDMutex;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::thread;
    ///
    /// let mutex = Arc::new(RDMutex::new());
    /// let value = Arc::new(AtomicU32::new(0));
    /// assert!(mutex.try_acquire_writer_block());
    ///
    /// let (m, v) = (Arc::clone(&mutex), Arc::clone(&value));
    /// let observer = thread::spawn(move || {
    ///     assert!(!m.try_acquire_writer_block());
    ///     m.wait_for_writer_block();
    ///     let seen = v.load(Ordering::Relaxed);
    ///     m.release_reader().unwrap();
    ///     seen
    /// });
    ///
    /// # thread::sleep(std::time::Duration::from_millis(10));
    /// value.store(7, Ordering::Relaxed);
    /// mutex.release_writer().unwrap();
    /// assert_eq!(observer.join().unwrap(), 7);
    /// ```
    pub fn wait_for_writer_block(&self) {
        self.wait_release_block(None)
    }

    /// Spins until the writer active at the time of the call has released.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// // No writer: returns at once.
    /// mutex.wait_for_writer_spin();
    /// ```
    pub fn wait_for_writer_spin(&self) {
        self.wait_release_spin(None)
    }

    /// Waits until the writer active at the time of the call has released, choosing
    /// blocking or spinning for the platform.
    ///
    /// - **Native**: same as [`wait_for_writer_block`](Self::wait_for_writer_block)
    /// - **WASM with `Atomics.wait`**: same as `wait_for_writer_block`
    /// - **WASM without `Atomics.wait`**: same as [`wait_for_writer_spin`](Self::wait_for_writer_spin)
    pub fn wait_for_writer_sync(&self) {
        self.wait_release_sync(None)
    }

    /// Awaits the release of the writer active at the time of the call.
    ///
    /// # Examples
    ///
    /// ```
    /// # test_executors::spin_on(async {
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// mutex.wait_for_writer_async().await;
    /// # });
    /// ```
    pub async fn wait_for_writer_async(&self) {
        self.wait_release_async(None).await
    }
}

// ================================================================================================
// Release waits
// ================================================================================================

// `seen` is the release count of the writer being waited on, or `None` to use
// whichever writer is active on the first check.
impl RDMutex {
    pub(crate) fn wait_release_block(&self, mut seen: Option<u64>) {
        while !self.released_or_register(&mut seen, Waiter::current_thread) {
            std::thread::park();
        }
    }

    pub(crate) fn wait_release_spin(&self, mut seen: Option<u64>) {
        while !self.released(&mut seen) {
            std::hint::spin_loop();
        }
    }

    pub(crate) fn wait_release_sync(&self, seen: Option<u64>) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.wait_release_block(seen)
        }
        #[cfg(target_arch = "wasm32")]
        {
            if atomics_wait_supported() {
                self.wait_release_block(seen)
            } else {
                self.wait_release_spin(seen)
            }
        }
    }

    pub(crate) async fn wait_release_async(&self, mut seen: Option<u64>) {
        loop {
            let mut receiver = None;
            let released = self.released_or_register(&mut seen, || {
                let (waiter, future) = Waiter::task();
                receiver = Some(future);
                waiter
            });
            if released {
                return;
            }
            if let Some(receiver) = receiver {
                receiver.await;
            }
        }
    }
}
