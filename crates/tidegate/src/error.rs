//! Unified error type for the Tidegate server.

use tidegate_protocol::ProtocolError;
use tidegate_session::SessionError;
use tidegate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tidegate` crate you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute on
/// each variant lets `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TidegateError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A framing error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (framing, write, registry).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
