// SPDX-License-Identifier: MIT OR Apache-2.0
//! The one error this crate reports.

/// The two roles a caller can hold on an [`RDMutex`](crate::RDMutex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Exclusive access; at most one holder.
    Writer,
    /// Shared access, either requested directly or the result of a demotion.
    Reader,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Writer => f.write_str("writer"),
            Role::Reader => f.write_str("reader"),
        }
    }
}

/// Error returned when a role is released without a matching acquire.
///
/// This is a logic bug in the calling code. The lock's state is left exactly as
/// it was, and nothing is retried or corrected.
///
/// # Examples
///
/// ```
/// use rdmutex::{InvalidRelease, RDMutex, Role};
///
/// let mutex = RDMutex::new();
/// assert_eq!(
///     mutex.release_reader(),
///     Err(InvalidRelease { role: Role::Reader })
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("unlocking an unlocked mutex ({role} role not held)")]
pub struct InvalidRelease {
    /// The role the caller tried to release.
    pub role: Role,
}
