// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::{Claim, RDMutex};
use crate::error::{InvalidRelease, Role};
use crate::waiter::Waiter;

#[cfg(target_arch = "wasm32")]
use crate::wasm_support::atomics_wait_supported;

impl RDMutex {
    /// Attempts to take the writer role, parking the thread while earlier readers drain.
    ///
    /// - If another writer is active, the caller is **demoted**: it is counted
    ///   as a reader and `false` is returned immediately. The caller must later
    ///   call [`release_reader`](Self::release_reader), normally after
    ///   [`wait_for_writer_block`](Self::wait_for_writer_block).
    /// - Otherwise the caller becomes the active writer, parks until every
    ///   counted reader has released, and `true` is returned. The caller owns
    ///   the protected resource until [`release_writer`](Self::release_writer).
    ///
    /// # Platform Behavior
    ///
    /// - **Native**: Uses thread parking for efficient blocking
    /// - **WASM with `Atomics.wait`**: Blocks using `Atomics.wait`
    /// - **WASM without `Atomics.wait`**: **Will panic** - use [`try_acquire_writer_sync`](Self::try_acquire_writer_sync) instead
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
    /// mutex.acquire_reader_block();
    ///
    /// let writer = Arc::clone(&mutex);
    /// let handle = thread::spawn(move || {
    ///     // Parks until the reader above releases.
    ///     let won = writer.try_acquire_writer_block();
    ///     writer.release_writer().unwrap();
    ///     won
    /// });
    ///
    /// # thread::sleep(std::time::Duration::from_millis(10));
    /// mutex.release_reader().unwrap();
    /// assert!(handle.join().unwrap());
    /// ```
    pub fn try_acquire_writer_block(&self) -> bool {
        match self.claim_writer() {
            Claim::Demoted { .. } => false,
            Claim::Acquired => true,
            Claim::Draining => {
                self.drain_block();
                true
            }
        }
    }

    /// Attempts to take the writer role, spinning while earlier readers drain.
    ///
    /// Same contract as [`try_acquire_writer_block`](Self::try_acquire_writer_block),
    /// but never parks. Use it where blocking is not allowed (e.g. the WASM main thread)
    /// or when readers are known to leave quickly.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// assert!(mutex.try_acquire_writer_spin());
    /// assert!(!mutex.try_acquire_writer_spin());
    /// assert_eq!(mutex.snapshot().reader_count, 1);
    /// ```
    pub fn try_acquire_writer_spin(&self) -> bool {
        match self.claim_writer() {
            Claim::Demoted { .. } => false,
            Claim::Acquired => true,
            Claim::Draining => {
                self.drain_spin();
                true
            }
        }
    }

    /// Attempts to take the writer role, choosing blocking or spinning for the platform.
    ///
    /// This is the strategy to reach for by default.
    ///
    /// - **Native**: same as [`try_acquire_writer_block`](Self::try_acquire_writer_block)
    /// - **WASM with `Atomics.wait`**: same as `try_acquire_writer_block`
    /// - **WASM without `Atomics.wait`**: same as [`try_acquire_writer_spin`](Self::try_acquire_writer_spin)
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// if mutex.try_acquire_writer_sync() {
    ///     // exclusive work
    ///     mutex.release_writer().unwrap();
    /// } else {
    ///     mutex.wait_for_writer_sync();
    ///     // read the settled value
    ///     mutex.release_reader().unwrap();
    /// }
    /// ```
    pub fn try_acquire_writer_sync(&self) -> bool {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.try_acquire_writer_block()
        }
        #[cfg(target_arch = "wasm32")]
        {
            if atomics_wait_supported() {
                self.try_acquire_writer_block()
            } else {
                self.try_acquire_writer_spin()
            }
        }
    }

    /// Attempts to take the writer role, awaiting earlier readers instead of blocking.
    ///
    /// Same contract as [`try_acquire_writer_block`](Self::try_acquire_writer_block).
    /// If the future is dropped while draining, the writer role it claimed is
    /// released again and anyone waiting on it is woken.
    ///
    /// # Examples
    ///
    /// ```
    /// # test_executors::spin_on(async {
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// assert!(mutex.try_acquire_writer_async().await);
    /// assert!(!mutex.try_acquire_writer_async().await);
    /// mutex.release_writer().unwrap();
    /// mutex.wait_for_writer_async().await;
    /// mutex.release_reader().unwrap();
    /// # });
    /// ```
    pub async fn try_acquire_writer_async(&self) -> bool {
        match self.claim_writer() {
            Claim::Demoted { .. } => false,
            Claim::Acquired => true,
            Claim::Draining => {
                self.drain_async().await;
                true
            }
        }
    }

    /// Releases the writer role and wakes every caller waiting for it.
    ///
    /// Callers blocked in `wait_for_writer_*` and `acquire_reader_*` all wake
    /// and re-check the lock.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRelease`] with [`Role::Writer`] if no writer is active.
    /// The lock is left untouched in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::{InvalidRelease, RDMutex, Role};
    ///
    /// let mutex = RDMutex::new();
    /// assert!(mutex.try_acquire_writer_sync());
    /// assert_eq!(mutex.release_writer(), Ok(()));
    /// assert_eq!(
    ///     mutex.release_writer(),
    ///     Err(InvalidRelease { role: Role::Writer })
    /// );
    /// ```
    pub fn release_writer(&self) -> Result<(), InvalidRelease> {
        if self.clear_writer() {
            log::trace!("writer released");
            Ok(())
        } else {
            log::warn!("release_writer called with no active writer");
            Err(InvalidRelease { role: Role::Writer })
        }
    }
}

// ================================================================================================
// Drain strategies
// ================================================================================================

impl RDMutex {
    /// Parks until no readers are counted.
    pub(crate) fn drain_block(&self) {
        while !self.drained_or_register(Waiter::current_thread) {
            std::thread::park();
        }
        log::trace!("writer drained");
    }

    pub(crate) fn drain_spin(&self) {
        while !self.drained() {
            std::hint::spin_loop();
        }
        log::trace!("writer drained");
    }

    pub(crate) fn drain_sync(&self) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.drain_block()
        }
        #[cfg(target_arch = "wasm32")]
        {
            if atomics_wait_supported() {
                self.drain_block()
            } else {
                self.drain_spin()
            }
        }
    }

    /// If the future is dropped before the readers drain, the writer role is
    /// given back so the lock is not left held by nobody.
    pub(crate) async fn drain_async(&self) {
        let mut abandon = AbandonDrain {
            mutex: self,
            armed: true,
        };
        loop {
            let mut receiver = None;
            let drained = self.drained_or_register(|| {
                let (waiter, future) = Waiter::task();
                receiver = Some(future);
                waiter
            });
            if drained {
                break;
            }
            if let Some(receiver) = receiver {
                receiver.await;
            }
        }
        abandon.armed = false;
        log::trace!("writer drained");
    }
}

/// Gives the writer role back if an async drain is dropped before it completes.
struct AbandonDrain<'a> {
    mutex: &'a RDMutex,
    armed: bool,
}

impl Drop for AbandonDrain<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("async writer dropped while draining; releasing writer role");
            self.mutex.clear_writer();
        }
    }
}
