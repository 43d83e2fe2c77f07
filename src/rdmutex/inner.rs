// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::gate::Gate;
use crate::waiter::{self, Waiter};

/// A reader/writer lock that demotes contending writers instead of queuing them.
///
/// `RDMutex` guards no data of its own; it brackets access to a resource its
/// owner keeps elsewhere. Two roles exist:
///
/// - **Writer**: exclusive. [`try_acquire_writer_sync`](Self::try_acquire_writer_sync)
///   returns `true` once the caller holds it and every reader has left.
/// - **Reader**: shared. Obtained explicitly with
///   [`acquire_reader_sync`](Self::acquire_reader_sync), or implicitly when a
///   writer attempt is *demoted* because another writer is already active.
///
/// A demoted caller got `false` from `try_acquire_writer_*` and is already counted
/// as a reader. It should call [`wait_for_writer_sync`](Self::wait_for_writer_sync)
/// to let the active writer finish, read the resource, and then call
/// [`release_reader`](Self::release_reader).
///
/// Every suspending operation comes in four strategies:
/// - **`_block`**: parks the thread
/// - **`_spin`**: spins, never parks
/// - **`_sync`**: blocks where the platform allows it, spins otherwise
/// - **`_async`**: awaits, never blocks the executor
///
/// # Known hazards
///
/// Writers never queue. A caller that tries to write while a writer is
/// *draining* (waiting for earlier readers to leave) is demoted and joins the
/// readers being drained. A steady stream of such callers can keep the drain
/// open indefinitely. Such a caller is one of the readers the writer waits for,
/// so if it calls `wait_for_writer_*` before `release_reader` the two wait on
/// each other forever. [`update_sync`](Self::update_sync) and
/// [`update_async`](Self::update_async) detect this case and release the
/// reader role before waiting.
///
/// # Examples
///
/// ```
/// use rdmutex::RDMutex;
///
/// let mutex = RDMutex::new();
///
/// assert!(mutex.try_acquire_writer_sync());
/// // A second writer attempt is demoted to a reader.
/// assert!(!mutex.try_acquire_writer_sync());
/// assert_eq!(mutex.snapshot().reader_count, 1);
///
/// mutex.release_writer().unwrap();
/// mutex.wait_for_writer_sync();
/// mutex.release_reader().unwrap();
/// assert_eq!(mutex.snapshot().reader_count, 0);
/// ```
pub struct RDMutex {
    pub(crate) gate: Gate<State>,
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) writer_active: bool,
    /// Set while the active writer is still waiting for `reader_count` to reach zero.
    pub(crate) draining: bool,
    pub(crate) reader_count: usize,
    /// Bumped by every writer release, so a waiter can tell "its" writer left
    /// even if another writer has since taken over.
    pub(crate) releases: u64,
    /// Woken together when `writer_active` goes false.
    pub(crate) writer_released: Vec<Waiter>,
    /// The draining writer, if any. One slot is enough: only one writer can be active.
    pub(crate) readers_drained: Option<Waiter>,
}

/// A point-in-time copy of an [`RDMutex`]'s bookkeeping.
///
/// The values may be stale as soon as they are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Snapshot {
    /// Whether a writer currently holds (or is draining toward) the lock.
    pub writer_active: bool,
    /// Readers currently counted, demoted writer attempts included.
    pub reader_count: usize,
}

/// Outcome of the non-suspending first half of a writer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// Another writer was active; the caller is now counted as a reader.
    /// `during_drain` is set if that writer was still waiting for readers,
    /// which now include the caller. `releases` identifies that writer for
    /// a later wait.
    Demoted { during_drain: bool, releases: u64 },
    /// The caller holds the writer role and no readers remain.
    Acquired,
    /// The caller holds the writer role but must wait for the counted readers to leave.
    Draining,
}

impl RDMutex {
    /// Creates a new, unlocked `RDMutex`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdmutex::RDMutex;
    ///
    /// static LOCK: RDMutex = RDMutex::new();
    /// assert!(!LOCK.snapshot().writer_active);
    /// ```
    pub const fn new() -> RDMutex {
        RDMutex {
            gate: Gate::new(State {
                writer_active: false,
                draining: false,
                reader_count: 0,
                releases: 0,
                writer_released: Vec::new(),
                readers_drained: None,
            }),
        }
    }

    /// Returns a copy of the current writer flag and reader count.
    pub fn snapshot(&self) -> Snapshot {
        self.gate.with_mut(|state| Snapshot {
            writer_active: state.writer_active,
            reader_count: state.reader_count,
        })
    }

    pub(crate) fn claim_writer(&self) -> Claim {
        let (claim, readers) = self.gate.with_mut(|state| {
            if state.writer_active {
                state.reader_count += 1;
                let claim = Claim::Demoted {
                    during_drain: state.draining,
                    releases: state.releases,
                };
                (claim, state.reader_count)
            } else {
                state.writer_active = true;
                state.draining = state.reader_count != 0;
                if state.draining {
                    (Claim::Draining, state.reader_count)
                } else {
                    (Claim::Acquired, 0)
                }
            }
        });
        match claim {
            Claim::Demoted { during_drain, .. } => {
                log::trace!(
                    "writer attempt demoted to reader ({readers} counted, writer draining: {during_drain})"
                );
            }
            Claim::Acquired => {
                log::trace!("writer acquired");
            }
            Claim::Draining => {
                log::debug!("writer acquired; waiting for {readers} reader(s) to drain");
            }
        }
        claim
    }

    /// Returns `true` once no readers remain, otherwise parks `waiter` in the drain slot.
    pub(crate) fn drained_or_register(&self, waiter: impl FnOnce() -> Waiter) -> bool {
        self.gate.with_mut(|state| {
            if state.reader_count == 0 {
                state.draining = false;
                state.readers_drained = None;
                true
            } else {
                state.readers_drained = Some(waiter());
                false
            }
        })
    }

    pub(crate) fn drained(&self) -> bool {
        self.gate.with_mut(|state| {
            if state.reader_count == 0 {
                state.draining = false;
                true
            } else {
                false
            }
        })
    }

    /// Returns `true` if no writer is active, or the writer seen on the first
    /// call (recorded in `seen`) has since released. Otherwise queues `waiter`
    /// for the release broadcast.
    pub(crate) fn released_or_register(
        &self,
        seen: &mut Option<u64>,
        waiter: impl FnOnce() -> Waiter,
    ) -> bool {
        self.gate.with_mut(|state| {
            if state.released_since(seen) {
                true
            } else {
                state.writer_released.push(waiter());
                false
            }
        })
    }

    pub(crate) fn released(&self, seen: &mut Option<u64>) -> bool {
        self.gate.with_mut(|state| state.released_since(seen))
    }

    /// Counts a reader if no writer is active, otherwise queues `waiter` for the release broadcast.
    pub(crate) fn enter_reader_or_register(&self, waiter: impl FnOnce() -> Waiter) -> bool {
        self.gate.with_mut(|state| {
            if state.writer_active {
                state.writer_released.push(waiter());
                false
            } else {
                state.reader_count += 1;
                true
            }
        })
    }

    pub(crate) fn try_enter_reader(&self) -> bool {
        self.gate.with_mut(|state| {
            if state.writer_active {
                false
            } else {
                state.reader_count += 1;
                true
            }
        })
    }

    /// Clears the writer flag and wakes everyone waiting for it. Returns `false`
    /// if no writer was active.
    pub(crate) fn clear_writer(&self) -> bool {
        let waiters = self.gate.with_mut(|state| {
            if !state.writer_active {
                return None;
            }
            state.writer_active = false;
            state.draining = false;
            state.releases = state.releases.wrapping_add(1);
            let mut waiters = std::mem::take(&mut state.writer_released);
            // Only left over if a draining writer gave up; wake it rather than drop it.
            waiters.extend(state.readers_drained.take());
            Some(waiters)
        });
        match waiters {
            Some(waiters) => {
                waiter::wake_all(waiters);
                true
            }
            None => false,
        }
    }
}

impl State {
    fn released_since(&self, seen: &mut Option<u64>) -> bool {
        if !self.writer_active {
            return true;
        }
        let seen = *seen.get_or_insert(self.releases);
        seen != self.releases
    }
}

impl Drop for State {
    // Waiters left behind by dropped async futures still hold unsent continuations.
    fn drop(&mut self) {
        let mut waiters = std::mem::take(&mut self.writer_released);
        waiters.extend(self.readers_drained.take());
        waiter::wake_all(waiters);
    }
}

impl Default for RDMutex {
    fn default() -> Self {
        RDMutex::new()
    }
}

impl std::fmt::Debug for RDMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("RDMutex")
            .field("writer_active", &snapshot.writer_active)
            .field("reader_count", &snapshot.reader_count)
            .finish_non_exhaustive()
    }
}
