//! Transport abstraction layer for Tidegate.
//!
//! Provides the [`Transport`] and [`Connection`] traits over a reliable,
//! ordered byte stream. A connection hands out whatever chunk the socket
//! produced; it knows nothing about message boundaries. Splitting the
//! stream into frames is the protocol layer's job.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP transport via `tokio::net`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::{ShutdownHandle, TcpConnection, TcpTransport};

use std::net::SocketAddr;

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Stops handing out new connections and wakes a pending
    /// [`accept`](Self::accept). Live connections are untouched.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single byte-stream connection.
///
/// Every method takes `&self` so the reader task and anyone else holding
/// the connection (a reaper closing it, a dispatcher writing a response)
/// can share it behind an `Arc`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Writes `data` to the peer as a single unit.
    ///
    /// A failed or short write is reported, never retried.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next chunk of bytes from the peer.
    ///
    /// Chunk boundaries are arbitrary. Returns `Ok(None)` when the peer
    /// closed the stream or the connection was closed locally.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection and wakes any pending [`recv`](Self::recv) or
    /// [`send`](Self::send).
    ///
    /// Closing twice is allowed and the second call does nothing.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the remote address of the peer.
    fn peer_addr(&self) -> SocketAddr;
}
