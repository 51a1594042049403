/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was already closed locally.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
