//! TCP transport implementation using `tokio::net`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, watch};

use crate::{Connection, Transport, TransportError};

/// Size of the scratch buffer handed to each socket read.
const READ_CHUNK: usize = 4096;

/// How long `close` waits for the write half before giving up on a FIN.
const CLOSE_WRITER_TIMEOUT: Duration = Duration::from_secs(1);

/// A TCP-based [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle that can stop this transport from another task, waking a
    /// pending [`accept`](Transport::accept).
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let stop = self.shutdown.flag.subscribe();
        if *stop.borrow() {
            return Err(TransportError::Shutdown);
        }

        let (stream, addr) = tokio::select! {
            accepted = self.listener.accept() => {
                accepted.map_err(TransportError::AcceptFailed)?
            }
            () = wait_closed(stop) => return Err(TransportError::Shutdown),
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
        }

        tracing::debug!(%addr, "accepted TCP connection");
        Ok(TcpConnection::new(stream, addr))
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        self.shutdown.shutdown();
        Ok(())
    }
}

/// Cloneable trigger that shuts a [`TcpTransport`] down.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Stops the transport. Live connections are untouched.
    pub fn shutdown(&self) {
        if !self.flag.send_replace(true) {
            tracing::info!("TCP transport shutting down");
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        *self.flag.borrow()
    }
}

/// A single TCP connection.
///
/// The stream is split into owned halves so a pending read never blocks a
/// write. Closing is broadcast through a `watch` channel: a reader parked
/// in [`recv`](Connection::recv) wakes up and reports end of stream, and a
/// writer parked in [`send`](Connection::send) gives up with
/// [`TransportError::ConnectionClosed`] and releases the write half.
pub struct TcpConnection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    peer: SocketAddr,
    closed: watch::Sender<bool>,
}

impl TcpConnection {
    fn new(stream: tokio::net::TcpStream, peer: SocketAddr) -> Self {
        let (reader, writer) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            peer,
            closed,
        }
    }

    fn closed_error(&self, what: &str) -> TransportError {
        TransportError::ConnectionClosed(format!("{what} to {}", self.peer))
    }
}

/// Resolves once the close flag flips to `true`.
async fn wait_closed(mut rx: watch::Receiver<bool>) {
    loop {
        let closed = *rx.borrow_and_update();
        if closed {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(self.closed_error("write after close"));
        }

        // A peer that stops reading can park the write forever; closing
        // must still get through.
        tokio::select! {
            written = async {
                self.writer.lock().await.write_all(data).await
            } => written.map_err(TransportError::SendFailed),
            () = wait_closed(closed) => {
                Err(self.closed_error("write interrupted by close"))
            }
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }

        let mut reader = self.reader.lock().await;
        let mut buf = vec![0u8; READ_CHUNK];

        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    Ok(Some(buf))
                }
                Err(e) => Err(TransportError::ReceiveFailed(e)),
            },
            () = wait_closed(closed) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        // `send_replace` hands back the previous flag: already closed.
        if self.closed.send_replace(true) {
            return Ok(());
        }
        tracing::debug!(peer = %self.peer, "closing TCP connection");
        let shutdown = async {
            self.writer.lock().await.shutdown().await
        };
        match tokio::time::timeout(CLOSE_WRITER_TIMEOUT, shutdown).await {
            Ok(result) => result.map_err(TransportError::SendFailed),
            Err(_) => {
                // The socket itself goes away with the last owner.
                tracing::debug!(
                    peer = %self.peer,
                    "write half still busy, skipping FIN"
                );
                Ok(())
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
