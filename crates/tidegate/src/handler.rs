//! Per-connection handler: the reader loop of one session.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Wrap the connection in a [`Session`] and register it with the
//!      session manager so the reaper can see it
//!   2. Loop: receive a chunk → append → drain every complete frame →
//!      dispatch each one
//!   3. Close the connection and unregister the session

use std::sync::Arc;

use tidegate_session::{Session, SessionId, SessionManager};
use tidegate_transport::{Connection, TcpConnection};
use tokio::sync::Mutex;

use crate::server::ServerState;
use crate::{Dispatcher, Flow, TidegateError};

/// Drop guard that unregisters a session when the handler exits.
///
/// This ensures cleanup happens even if the dispatcher panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct SessionGuard {
    session_id: SessionId,
    sessions: Arc<Mutex<SessionManager<TcpConnection>>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session_id = self.session_id;
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            // NotFound just means the reaper got there first.
            let _ = sessions.lock().await.remove(session_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<D: Dispatcher>(
    conn: TcpConnection,
    state: Arc<ServerState<D>>,
) -> Result<(), TidegateError> {
    let peer = conn.peer_addr();
    let mut session = Session::new(conn, state.frame.clone());
    let session_id = session.id();

    state.sessions.lock().await.register(session.handle())?;
    let _guard = SessionGuard {
        session_id,
        sessions: Arc::clone(&state.sessions),
    };

    tracing::info!(%session_id, %peer, "session opened");

    let result = read_loop(&mut session, &state).await;

    // Idempotent: the loop may already have closed it.
    session.close().await;
    tracing::info!(%session_id, "session closed");

    result
    // _guard drops here → session is unregistered.
}

/// Reads chunks until the peer leaves, the session is closed, or a frame
/// cannot be handled.
async fn read_loop<D: Dispatcher>(
    session: &mut Session<TcpConnection>,
    state: &ServerState<D>,
) -> Result<(), TidegateError> {
    let session_id = session.id();

    loop {
        let chunk = match session.connection().recv().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                tracing::debug!(%session_id, "end of stream");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%session_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        session.append(&chunk);

        // One chunk may complete any number of frames.
        loop {
            let frame = match session.next_message() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(
                        %session_id,
                        error = %e,
                        buffered = session.buffered_len(),
                        "unrecoverable framing error, dropping session"
                    );
                    return Err(e.into());
                }
            };

            tracing::debug!(
                %session_id,
                message_id = frame.message_id,
                len = frame.body.len(),
                "frame received"
            );

            match state.dispatcher.dispatch(session, frame).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => {
                    tracing::debug!(%session_id, "dispatcher requested close");
                    return Ok(());
                }
                Ok(Flow::LogoutAndClose) => {
                    tracing::debug!(%session_id, "dispatcher requested logout");
                    session.logout_and_close().await;
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(%session_id, error = %e, "dispatch failed");
                    return Err(e.into());
                }
            }
        }
    }
}
