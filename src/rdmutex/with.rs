// SPDX-License-Identifier: MIT OR Apache-2.0
use super::inner::{Claim, RDMutex};
use crate::error::InvalidRelease;

impl RDMutex {
    /// Runs `write` as the writer, or `observe` as a demoted reader once the writer is done.
    ///
    /// This is the usual way to use the lock: every caller tries to write, the
    /// first one wins, and the rest wait for it and then look at the result.
    /// The matching release is always performed.
    ///
    /// A caller demoted while the writer is still draining would otherwise
    /// hold that drain open while waiting on it. In that case the demoted
    /// reader role is given back first and `observe` runs under a fresh
    /// reader role taken once the writer is done.
    ///
    /// A panic in either closure leaves the role held.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRelease`] if the role was released behind the caller's
    /// back (another caller released more than it acquired).
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    /// use std::cell::Cell;
    ///
    /// let mutex = RDMutex::new();
    /// let counter = Cell::new(0);
    ///
    /// let seen = mutex
    ///     .update_sync(
    ///         || {
    ///             counter.set(counter.get() + 1);
    ///             counter.get()
    ///         },
    ///         || counter.get(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(seen, 1);
    /// ```
    pub fn update_sync<R>(
        &self,
        write: impl FnOnce() -> R,
        observe: impl FnOnce() -> R,
    ) -> Result<R, InvalidRelease> {
        match self.claim_writer() {
            Claim::Acquired => {}
            Claim::Draining => self.drain_sync(),
            Claim::Demoted {
                during_drain: true, ..
            } => {
                self.release_reader()?;
                return self.read_sync(observe);
            }
            Claim::Demoted {
                during_drain: false,
                releases,
            } => {
                self.wait_release_sync(Some(releases));
                let r = observe();
                self.release_reader()?;
                return Ok(r);
            }
        }
        let r = write();
        self.release_writer()?;
        Ok(r)
    }

    /// Async version of [`update_sync`](Self::update_sync).
    ///
    /// Dropping the future gives back whatever role it holds at that point.
    pub async fn update_async<R>(
        &self,
        write: impl FnOnce() -> R,
        observe: impl FnOnce() -> R,
    ) -> Result<R, InvalidRelease> {
        match self.claim_writer() {
            Claim::Acquired => {}
            Claim::Draining => self.drain_async().await,
            Claim::Demoted {
                during_drain: true, ..
            } => {
                self.release_reader()?;
                return self.read_async(observe).await;
            }
            Claim::Demoted {
                during_drain: false,
                releases,
            } => {
                let mut abandon = AbandonWait {
                    mutex: self,
                    armed: true,
                };
                self.wait_release_async(Some(releases)).await;
                abandon.armed = false;
                let r = observe();
                self.release_reader()?;
                return Ok(r);
            }
        }
        let r = write();
        self.release_writer()?;
        Ok(r)
    }

    /// Runs `read` while holding a reader role.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRelease`] if the reader role was released behind the caller's back.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// let mutex = RDMutex::new();
    /// let value = 5;
    /// assert_eq!(mutex.read_sync(|| value * 2), Ok(10));
    /// ```
    pub fn read_sync<R>(&self, read: impl FnOnce() -> R) -> Result<R, InvalidRelease> {
        self.acquire_reader_sync();
        let r = read();
        self.release_reader()?;
        Ok(r)
    }

    /// Async version of [`read_sync`](Self::read_sync).
    pub async fn read_async<R>(&self, read: impl FnOnce() -> R) -> Result<R, InvalidRelease> {
        self.acquire_reader_async().await;
        let r = read();
        self.release_reader()?;
        Ok(r)
    }
}

/// Gives the demoted reader role back if an async update is dropped while
/// waiting for the writer.
struct AbandonWait<'a> {
    mutex: &'a RDMutex,
    armed: bool,
}

impl Drop for AbandonWait<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("async update dropped while demoted; releasing reader role");
            // Only fails if another caller over-released; that is logged already.
            let _ = self.mutex.release_reader();
        }
    }
}
