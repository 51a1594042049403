//! # Tidegate
//!
//! Connection sessions and length-prefixed binary framing for game
//! backends.
//!
//! Every accepted TCP connection becomes a [`Session`]: it buffers raw
//! bytes, cuts them into frames (`u32 length | u32 message id | body`,
//! little-endian), and hands each frame to your [`Dispatcher`]. The
//! dispatcher replies through the session, binds the logged-in player's
//! identity, and decides when the connection ends. A background reaper
//! closes sessions that stay silent longer than the configured expiry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tidegate::prelude::*;
//!
//! struct Echo;
//!
//! impl Dispatcher for Echo {
//!     async fn dispatch(
//!         &self,
//!         session: &mut Session<TcpConnection>,
//!         frame: Frame,
//!     ) -> Result<Flow, SessionError> {
//!         session.send(frame.message_id, &frame.body).await?;
//!         Ok(Flow::Continue)
//!     }
//! }
//!
//! # async fn start() -> Result<(), TidegateError> {
//! let server = TidegateServerBuilder::new()
//!     .bind("0.0.0.0:7000")
//!     .build(Echo)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod reaper;
mod server;

pub use config::ServerConfig;
pub use dispatch::{Dispatcher, Flow};
pub use error::TidegateError;
pub use server::{SessionCount, TidegateServer, TidegateServerBuilder};

pub use tidegate_protocol::{
    Frame, FrameBuffer, FrameConfig, HEADER_LEN, ID_LEN, ProtocolError,
    encode_frame,
};
pub use tidegate_session::{
    ActivityStamp, ExpiryThreshold, Identity, PlayerIdentity, Session,
    SessionError, SessionHandle, SessionId, SessionIdRegistry,
    SessionManager,
};
pub use tidegate_transport::{
    Connection, ShutdownHandle, TcpConnection, TcpTransport, Transport,
    TransportError,
};

/// Everything needed to write a dispatcher and start a server.
pub mod prelude {
    pub use crate::{
        Dispatcher, Flow, Frame, FrameConfig, Identity, PlayerIdentity,
        ServerConfig, Session, SessionError, SessionId, TcpConnection,
        TidegateError, TidegateServer, TidegateServerBuilder, encode_frame,
    };
}
