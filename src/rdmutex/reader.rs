// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::RDMutex;
use crate::error::{InvalidRelease, Role};
use crate::waiter::Waiter;

#[cfg(target_arch = "wasm32")]
use crate::wasm_support::atomics_wait_supported;

impl RDMutex {
    /// Takes a reader role, parking the thread while a writer is active.
    ///
    /// Explicit readers are never demoted and never fail; they simply wait for
    /// the active writer (if any) to release. Every call must be matched by a
    /// [`release_reader`](Self::release_reader).
    ///
    /// # Platform Behavior
    ///
    /// - **Native**: Uses thread parking for efficient blocking
    /// - **WASM with `Atomics.wait`**: Blocks using `Atomics.wait`
    /// - **WASM without `Atomics.wait`**: **Will panic** - use [`acquire_reader_sync`](Self::acquire_reader_sync) instead
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// mutex.acquire_reader_block();
    /// mutex.acquire_reader_block();
    /// assert_eq!(mutex.snapshot().reader_count, 2);
    /// ```
    pub fn acquire_reader_block(&self) {
        while !self.enter_reader_or_register(Waiter::current_thread) {
            std::thread::park();
        }
        log::trace!("reader acquired");
    }

    /// Takes a reader role, spinning while a writer is active.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// mutex.acquire_reader_spin();
    /// mutex.release_reader().unwrap();
    /// ```
    pub fn acquire_reader_spin(&self) {
        while !self.try_enter_reader() {
            std::hint::spin_loop();
        }
        log::trace!("reader acquired");
    }

    /// Takes a reader role, choosing blocking or spinning for the platform.
    ///
    /// - **Native**: same as [`acquire_reader_block`](Self::acquire_reader_block)
    /// - **WASM with `Atomics.wait`**: same as `acquire_reader_block`
    /// - **WASM without `Atomics.wait`**: same as [`acquire_reader_spin`](Self::acquire_reader_spin)
    ///
    /// # Examples
    ///
    /// ```
    /// # // std::thread::spawn panics on wasm32
    /// # if cfg!(target_arch = "wasm32") { return; }
    /// use rdmutex::RDMutex;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let mutex = Arc::new(RDMutex::new());
    /// let handles: Vec<_> = (0..3)
    ///     .map(|_| {
    ///         let mutex = Arc::clone(&mutex);
    ///         thread::spawn(move || {
    ///             mutex.acquire_reader_sync();
    ///             mutex.release_reader().unwrap();
    ///         })
    ///     })
    ///     .collect();
    /// for handle in handles {
    ///     handle.join().unwrap();
    /// }
    /// assert_eq!(mutex.snapshot().reader_count, 0);
    /// ```
    pub fn acquire_reader_sync(&self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.acquire_reader_block()
        }
        #[cfg(target_arch = "wasm32")]
        {
            if atomics_wait_supported() {
                self.acquire_reader_block()
            } else {
                self.acquire_reader_spin()
            }
        }
    }

    /// Takes a reader role, awaiting an active writer instead of blocking.
    ///
    /// Dropping the future before it resolves leaves the reader count untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// # test_executors::spin_on(async {
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// mutex.acquire_reader_async().await;
    /// assert_eq!(mutex.snapshot().reader_count, 1);
    /// mutex.release_reader().unwrap();
    /// # });
    /// ```
    pub async fn acquire_reader_async(&self) {
        loop {
            let mut receiver = None;
            let entered = self.enter_reader_or_register(|| {
                let (waiter, future) = Waiter::task();
                receiver = Some(future);
                waiter
            });
            if entered {
                break;
            }
            if let Some(receiver) = receiver {
                receiver.await;
            }
        }
        log::trace!("reader acquired");
    }

    /// Releases a reader role.
    ///
    /// When the last counted reader leaves, a writer draining in
    /// `try_acquire_writer_*` is woken. Only that one waiter is notified; at
    /// most one writer can be draining at a time.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRelease`] with [`Role::Reader`] if no reader is
    /// counted. The count stays at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::{InvalidRelease, RDMutex, Role};
    ///
    /// let mutex = RDMutex::new();
    /// mutex.acquire_reader_sync();
    /// assert_eq!(mutex.release_reader(), Ok(()));
    /// assert_eq!(
    ///     mutex.release_reader(),
    ///     Err(InvalidRelease { role: Role::Reader })
    /// );
    /// ```
    pub fn release_reader(&self) -> Result<(), InvalidRelease> {
        let released = self.gate.with_mut(|state| {
            if state.reader_count == 0 {
                return None;
            }
            state.reader_count -= 1;
            if state.reader_count == 0 {
                Some(state.readers_drained.take())
            } else {
                Some(None)
            }
        });
        match released {
            Some(drained) => {
                log::trace!("reader released");
                if let Some(writer) = drained {
                    writer.wake();
                }
                Ok(())
            }
            None => {
                log::warn!("release_reader called with no readers counted");
                Err(InvalidRelease { role: Role::Reader })
            }
        }
    }
}
