//! The session: one accepted connection and everything known about it.
//!
//! A session tracks:
//! - WHO it is (a [`SessionId`] issued at construction)
//! - WHAT has arrived but not been consumed (the inbound frame buffer)
//! - WHEN the peer was last heard from (an [`ActivityStamp`])
//! - WHICH player, if any, is logged in through it (an [`Identity`])
//!
//! # Concurrency
//!
//! A session is driven by exactly one reader task, which is why
//! [`append`](Session::append) and [`next_message`](Session::next_message)
//! take `&mut self` and nothing is locked. Other parties that need to see
//! the session (the expiry reaper) get a [`SessionHandle`], which can only
//! read the activity stamp and close the connection.

use std::sync::Arc;

use tidegate_protocol::{Frame, FrameBuffer, FrameConfig, encode_frame};
use tidegate_transport::{Connection, TransportError};

use crate::{
    ActivityStamp, ExpiryThreshold, Identity, SessionError, SessionId,
    SessionIdRegistry,
};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Server-side state of one live connection.
pub struct Session<C: Connection<Error = TransportError>> {
    id: SessionId,
    connection: Arc<C>,
    inbound: FrameBuffer,
    activity: ActivityStamp,
    identity: Identity,
}

impl<C: Connection<Error = TransportError>> Session<C> {
    /// Wraps a freshly accepted connection, taking an id from the global
    /// registry.
    pub fn new(connection: C, frame_config: FrameConfig) -> Self {
        Self::with_registry(
            connection,
            SessionIdRegistry::global(),
            frame_config,
        )
    }

    /// Same as [`new`](Self::new) but draws the id from `registry`.
    pub fn with_registry(
        connection: C,
        registry: &SessionIdRegistry,
        frame_config: FrameConfig,
    ) -> Self {
        Self {
            id: registry.next_id(),
            connection: Arc::new(connection),
            inbound: FrameBuffer::new(frame_config),
            activity: ActivityStamp::new(),
            identity: Identity::default(),
        }
    }

    /// The id issued when the session was created.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// The currently bound identity (the default value when unbound).
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Last inbound activity, in Unix seconds.
    pub fn last_active_secs(&self) -> u64 {
        self.activity.last_active_secs()
    }

    /// Number of received bytes not yet consumed into a frame.
    pub fn buffered_len(&self) -> usize {
        self.inbound.len()
    }

    /// Appends a received chunk and marks the session active.
    ///
    /// An empty chunk changes nothing.
    pub fn append(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.inbound.append(chunk);
        self.activity.touch();
    }

    /// Pulls the next complete frame, if one has fully arrived.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Call in a loop after
    /// every [`append`](Self::append).
    ///
    /// # Errors
    /// [`SessionError::Protocol`] when the peer declared a length that can
    /// never be satisfied; the session should be closed.
    pub fn next_message(&mut self) -> Result<Option<Frame>, SessionError> {
        Ok(self.inbound.try_extract()?)
    }

    /// Frames `body` under `message_id` and writes it as one unit.
    ///
    /// # Errors
    /// The write error is handed back as-is; nothing is retried.
    pub async fn send(
        &self,
        message_id: u32,
        body: &[u8],
    ) -> Result<(), SessionError> {
        let bytes = encode_frame(message_id, body)?;
        self.connection.send(&bytes).await?;
        tracing::trace!(
            session_id = %self.id,
            message_id,
            len = bytes.len(),
            "frame sent"
        );
        Ok(())
    }

    /// Checks the activity stamp against the threshold's current value.
    pub fn has_expired(&self, threshold: &ExpiryThreshold) -> bool {
        self.activity.has_expired(threshold)
    }

    /// Attaches a logged-in player, replacing any previous binding.
    pub fn bind_identity(&mut self, identity: Identity) {
        tracing::info!(
            session_id = %self.id,
            player_id = %identity.player_id,
            partner_id = identity.partner_id,
            server_id = identity.server_id,
            "player bound to session"
        );
        self.identity = identity;
    }

    /// Clears the player binding. Safe to call when nothing is bound.
    pub fn unbind_identity(&mut self) {
        if self.identity.is_bound() {
            tracing::info!(
                session_id = %self.id,
                player_id = %self.identity.player_id,
                "player unbound from session"
            );
        }
        self.identity = Identity::default();
    }

    /// Closes the connection. Best effort: a failure is logged, not
    /// returned.
    pub async fn close(&self) {
        close_connection(self.id, self.connection.as_ref()).await;
    }

    /// Unbinds the player, then closes the connection.
    pub async fn logout_and_close(&mut self) {
        self.unbind_identity();
        self.close().await;
    }

    /// A cloneable view for the expiry reaper.
    pub fn handle(&self) -> SessionHandle<C> {
        SessionHandle {
            id: self.id,
            connection: Arc::clone(&self.connection),
            activity: self.activity.clone(),
        }
    }
}

async fn close_connection<C: Connection<Error = TransportError>>(
    id: SessionId,
    connection: &C,
) {
    if let Err(e) = connection.close().await {
        tracing::debug!(session_id = %id, error = %e, "close failed");
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Shared view of a session held by the registry of live sessions.
///
/// It sees the same activity stamp as the session and can close the
/// connection, which wakes the reader task and ends the session.
pub struct SessionHandle<C: Connection<Error = TransportError>> {
    id: SessionId,
    connection: Arc<C>,
    pub(crate) activity: ActivityStamp,
}

impl<C: Connection<Error = TransportError>> SessionHandle<C> {
    /// Id of the session behind this handle.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Last inbound activity, in Unix seconds.
    pub fn last_active_secs(&self) -> u64 {
        self.activity.last_active_secs()
    }

    /// Checks the shared activity stamp against the threshold.
    pub fn has_expired(&self, threshold: &ExpiryThreshold) -> bool {
        self.activity.has_expired(threshold)
    }

    pub(crate) fn has_expired_at(&self, now: u64, expiry_secs: u64) -> bool {
        self.activity.has_expired_at(now, expiry_secs)
    }

    /// Force-closes the connection. Best effort.
    pub async fn close(&self) {
        close_connection(self.id, self.connection.as_ref()).await;
    }
}

// Manual impl: deriving would demand `C: Clone`.
impl<C: Connection<Error = TransportError>> Clone for SessionHandle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            connection: Arc::clone(&self.connection),
            activity: self.activity.clone(),
        }
    }
}
