//! Error types for the session layer.

use tidegate_protocol::ProtocolError;
use tidegate_transport::TransportError;

use crate::SessionId;

/// Errors that can occur while driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The inbound stream broke a framing rule and cannot continue.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Writing to or closing the underlying connection failed.
    ///
    /// Writes are never retried here: re-sending part of a frame would
    /// corrupt the stream for the peer.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No live session is registered under this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A live session already uses this id (the counter wrapped around).
    #[error("session {0} is already registered")]
    DuplicateId(SessionId),
}
