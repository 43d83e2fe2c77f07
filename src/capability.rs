// SPDX-License-Identifier: MIT OR Apache-2.0
//! The lock's five operations as a trait, for code that wants to be generic over the backing lock.

use crate::error::InvalidRelease;
use crate::rdmutex::RDMutex;

/// A lock with the demoting writer policy of [`RDMutex`].
///
/// Call sites written against this trait can be exercised with a test double
/// that records the order of calls, without any real blocking.
///
/// # Examples
///
/// ```
/// use rdmutex::{DemotingLock, InvalidRelease, RDMutex};
///
/// fn bump<L: DemotingLock>(lock: &L, value: &mut u32) -> Result<(), InvalidRelease> {
///     if lock.try_acquire_writer() {
///         *value += 1;
///         lock.release_writer()
///     } else {
///         lock.wait_for_writer();
///         lock.release_reader()
///     }
/// }
///
/// let mut value = 0;
/// bump(&RDMutex::new(), &mut value).unwrap();
/// assert_eq!(value, 1);
/// ```
pub trait DemotingLock {
    /// Becomes the writer (`true`) or is demoted to a reader (`false`).
    fn try_acquire_writer(&self) -> bool;
    /// Waits until the writer active on the first check has released.
    ///
    /// Returns at once if no writer is active, and does not wait for a writer
    /// that claims the lock afterwards.
    fn wait_for_writer(&self);
    /// Gives up the writer role.
    fn release_writer(&self) -> Result<(), InvalidRelease>;
    /// Becomes a reader, waiting out any active writer.
    fn acquire_reader(&self);
    /// Gives up a reader role.
    fn release_reader(&self) -> Result<(), InvalidRelease>;
}

impl DemotingLock for RDMutex {
    fn try_acquire_writer(&self) -> bool {
        self.try_acquire_writer_sync()
    }

    fn wait_for_writer(&self) {
        self.wait_for_writer_sync()
    }

    fn release_writer(&self) -> Result<(), InvalidRelease> {
        RDMutex::release_writer(self)
    }

    fn acquire_reader(&self) {
        self.acquire_reader_sync()
    }

    fn release_reader(&self) -> Result<(), InvalidRelease> {
        RDMutex::release_reader(self)
    }
}

impl<L: DemotingLock + ?Sized> DemotingLock for std::sync::Arc<L> {
    fn try_acquire_writer(&self) -> bool {
        (**self).try_acquire_writer()
    }

    fn wait_for_writer(&self) {
        (**self).wait_for_writer()
    }

    fn release_writer(&self) -> Result<(), InvalidRelease> {
        (**self).release_writer()
    }

    fn acquire_reader(&self) {
        (**self).acquire_reader()
    }

    fn release_reader(&self) -> Result<(), InvalidRelease> {
        (**self).release_reader()
    }
}
