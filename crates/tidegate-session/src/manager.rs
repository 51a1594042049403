//! The session manager: an index of every live session.
//!
//! Sessions themselves are owned by their reader tasks. The manager only
//! keeps a [`SessionHandle`] per session so that a periodic sweep can find
//! the ones that went quiet and close them.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself. It uses a plain
//! `HashMap`. The server wraps it in a mutex and keeps network I/O out of
//! the critical section: [`drain_expired`](SessionManager::drain_expired)
//! only removes handles, the caller closes them after releasing the lock.

use std::collections::HashMap;

use tidegate_transport::{Connection, TransportError};

use crate::{ExpiryThreshold, SessionError, SessionHandle, SessionId, unix_now};

/// Registry of live sessions, keyed by [`SessionId`].
///
/// ```text
/// accept ──→ register() ──→ [live] ──→ remove()        (reader task ends)
///                              │
///                              └──→ drain_expired() ──→ close()  (reaper)
/// ```
pub struct SessionManager<C: Connection<Error = TransportError>> {
    sessions: HashMap<SessionId, SessionHandle<C>>,
}

impl<C: Connection<Error = TransportError>> SessionManager<C> {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Starts tracking a session.
    ///
    /// # Errors
    /// [`SessionError::DuplicateId`] if the id is already live, which can
    /// only happen after the id counter wrapped around.
    pub fn register(
        &mut self,
        handle: SessionHandle<C>,
    ) -> Result<(), SessionError> {
        let id = handle.id();
        if self.sessions.contains_key(&id) {
            return Err(SessionError::DuplicateId(id));
        }
        self.sessions.insert(id, handle);
        tracing::debug!(session_id = %id, "session registered");
        Ok(())
    }

    /// Stops tracking a session and returns its handle.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the id is not live (e.g. the reaper
    /// already took it).
    pub fn remove(
        &mut self,
        id: SessionId,
    ) -> Result<SessionHandle<C>, SessionError> {
        self.sessions.remove(&id).ok_or(SessionError::NotFound(id))
    }

    /// Looks up a live session by id.
    pub fn get(&self, id: &SessionId) -> Option<&SessionHandle<C>> {
        self.sessions.get(id)
    }

    /// Ids of every session past the threshold, without removing them.
    pub fn expired(&self, threshold: &ExpiryThreshold) -> Vec<SessionId> {
        let now = unix_now();
        let expiry_secs = threshold.get();
        self.sessions
            .values()
            .filter(|h| h.has_expired_at(now, expiry_secs))
            .map(SessionHandle::id)
            .collect()
    }

    /// Removes every session past the threshold and returns the handles.
    ///
    /// The caller is expected to [`close`](SessionHandle::close) each one.
    pub fn drain_expired(
        &mut self,
        threshold: &ExpiryThreshold,
    ) -> Vec<SessionHandle<C>> {
        let now = unix_now();
        let expiry_secs = threshold.get();

        let ids: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|h| h.has_expired_at(now, expiry_secs))
            .map(SessionHandle::id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.sessions.remove(&id))
            .inspect(|h| {
                tracing::info!(
                    session_id = %h.id(),
                    last_active = h.last_active_secs(),
                    "session expired"
                );
            })
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<C: Connection<Error = TransportError>> Default for SessionManager<C> {
    fn default() -> Self {
        Self::new()
    }
}
