//! Per-connection session state for Tidegate.
//!
//! This crate owns everything the server knows about one accepted
//! connection:
//!
//! 1. **Identity issuance**: a process-unique [`SessionId`] from a
//!    lock-free [`SessionIdRegistry`]
//! 2. **Framing state**: the unconsumed inbound bytes of a [`Session`]
//! 3. **Liveness**: last-activity time and the shared
//!    [`ExpiryThreshold`] a reaper compares it against
//! 4. **Player binding**: the [`Identity`] attached on login and cleared
//!    on logout
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← accept loop, dispatcher, expiry reaper
//!     ↕
//! Session Layer (this crate)  ← one Session per connection
//!     ↕
//! Protocol + Transport (below)  ← frames, byte-stream connections
//! ```

mod error;
mod id;
mod identity;
mod liveness;
mod manager;
mod session;

pub use error::SessionError;
pub use id::{SessionId, SessionIdRegistry};
pub use identity::{Identity, PlayerIdentity};
pub use liveness::{ActivityStamp, ExpiryThreshold, unix_now};
pub use manager::SessionManager;
pub use session::{Session, SessionHandle};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Connection`] used by the unit tests.

    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tidegate_transport::{Connection, TransportError};

    /// Records every write and counts closes instead of touching a socket.
    #[derive(Default)]
    pub(crate) struct MockConnection {
        pub(crate) sent: Mutex<Vec<Vec<u8>>>,
        pub(crate) closes: AtomicUsize,
        pub(crate) fail_writes: bool,
        pub(crate) fail_close: bool,
    }

    impl MockConnection {
        pub(crate) fn failing() -> Self {
            Self {
                fail_writes: true,
                fail_close: true,
                ..Self::default()
            }
        }

        pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().expect("mock lock").clone()
        }

        pub(crate) fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    fn broken_pipe() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock")
    }

    impl Connection for MockConnection {
        type Error = TransportError;

        async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
            if self.fail_writes {
                return Err(TransportError::SendFailed(broken_pipe()));
            }
            self.sent.lock().expect("mock lock").push(data.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            Ok(None)
        }

        async fn close(&self) -> Result<(), Self::Error> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(TransportError::SendFailed(broken_pipe()));
            }
            Ok(())
        }

        fn peer_addr(&self) -> SocketAddr {
            SocketAddr::from(([127, 0, 0, 1], 0))
        }
    }
}
