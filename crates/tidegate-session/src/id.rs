//! Session identifier issuance.
//!
//! Every accepted connection gets a [`SessionId`] from a shared counter.
//! Many connections are accepted at once, so the counter is a plain
//! `AtomicI32` and issuing an id never takes a lock.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Process-unique identifier of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub i32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// The registry behind [`SessionIdRegistry::global`].
static GLOBAL: SessionIdRegistry = SessionIdRegistry::new();

/// Monotonic source of [`SessionId`]s, starting at 1.
///
/// Ids are never reused. The counter is 32 bits wide and wraps around
/// after `i32::MAX` like any fixed-width integer; a server would need
/// two billion accepts in one process lifetime to get there.
#[derive(Debug)]
pub struct SessionIdRegistry {
    next: AtomicI32,
}

impl SessionIdRegistry {
    /// Creates a registry whose first id is 1.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a registry whose first id is `first`.
    pub const fn starting_at(first: i32) -> Self {
        Self {
            next: AtomicI32::new(first),
        }
    }

    /// The process-wide registry used by [`Session::new`](crate::Session::new).
    pub fn global() -> &'static SessionIdRegistry {
        &GLOBAL
    }

    /// Issues the next id. Safe to call from any number of threads.
    pub fn next_id(&self) -> SessionId {
        // `fetch_add` returns the value before the increment and wraps
        // on overflow.
        SessionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionIdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
