//! Expiry reaper: periodically closes sessions that went quiet.
//!
//! Sessions never time themselves out. The reaper wakes up on a fixed
//! interval, takes every expired handle out of the session manager, and
//! closes its connection. Closing wakes the session's reader task, which
//! then finishes its own cleanup.

use std::sync::Arc;
use std::time::Duration;

use tidegate_session::{ExpiryThreshold, SessionManager};
use tidegate_transport::TcpConnection;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

/// Runs the sweep forever on `every`.
pub(crate) async fn run(
    sessions: Arc<Mutex<SessionManager<TcpConnection>>>,
    expiry: ExpiryThreshold,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    // A slow sweep must not trigger a burst of catch-up sweeps.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(interval = ?every, "reaper started");

    loop {
        ticker.tick().await;
        sweep(&sessions, &expiry).await;
    }
}

/// Takes every expired session out of the manager and starts closing it.
async fn sweep(
    sessions: &Mutex<SessionManager<TcpConnection>>,
    expiry: &ExpiryThreshold,
) {
    // Lock only to take the handles; close them after the lock is gone.
    let expired = sessions.lock().await.drain_expired(expiry);
    let count = expired.len();

    // Each close runs on its own task so one slow socket cannot hold up
    // the sweep.
    for handle in expired {
        tokio::spawn(async move { handle.close().await });
    }

    if count > 0 {
        tracing::info!(
            count,
            expiry_secs = expiry.get(),
            "reaped expired sessions"
        );
    }
}
