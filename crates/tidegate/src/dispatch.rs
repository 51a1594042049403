//! The dispatch hook: where decoded frames leave the framework.
//!
//! Tidegate does not interpret message ids or bodies. Every complete frame
//! is handed to the server's [`Dispatcher`] together with the session it
//! arrived on. The dispatcher answers through [`Session::send`], binds or
//! unbinds the player, and tells the reader loop whether to keep going.

use std::future::Future;

use tidegate_protocol::Frame;
use tidegate_session::{Session, SessionError};
use tidegate_transport::TcpConnection;

/// What the reader loop should do after a frame was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// Close the connection; the bound identity is left as is.
    Close,
    /// Unbind the player, then close the connection.
    LogoutAndClose,
}

/// Application logic that consumes frames.
///
/// # Example
///
/// ```rust
/// use tidegate::prelude::*;
///
/// /// Sends every frame straight back.
/// struct Echo;
///
/// impl Dispatcher for Echo {
///     async fn dispatch(
///         &self,
///         session: &mut Session<TcpConnection>,
///         frame: Frame,
///     ) -> Result<Flow, SessionError> {
///         session.send(frame.message_id, &frame.body).await?;
///         Ok(Flow::Continue)
///     }
/// }
/// ```
pub trait Dispatcher: Send + Sync + 'static {
    /// Handles one frame received on `session`.
    ///
    /// Returning an error ends the session: the connection is closed and
    /// the error is logged.
    fn dispatch(
        &self,
        session: &mut Session<TcpConnection>,
        frame: Frame,
    ) -> impl Future<Output = Result<Flow, SessionError>> + Send;
}
