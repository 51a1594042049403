//! `TidegateServer` builder and server loop.
//!
//! This is the entry point for running a Tidegate server. It ties together
//! all the layers: transport → protocol → session → dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tidegate_protocol::FrameConfig;
use tidegate_session::{ExpiryThreshold, SessionManager};
use tidegate_transport::{
    ShutdownHandle, TcpConnection, TcpTransport, Transport, TransportError,
};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{Dispatcher, ServerConfig, TidegateError, reaper};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<D: Dispatcher> {
    pub(crate) sessions: Arc<Mutex<SessionManager<TcpConnection>>>,
    pub(crate) dispatcher: D,
    pub(crate) expiry: ExpiryThreshold,
    pub(crate) frame: FrameConfig,
}

/// Builder for configuring and starting a Tidegate server.
///
/// # Example
///
/// ```rust,ignore
/// use tidegate::prelude::*;
///
/// let server = TidegateServerBuilder::new()
///     .bind("0.0.0.0:7000")
///     .expiry_secs(120)
///     .build(MyDispatcher)
///     .await?;
/// server.run().await
/// ```
pub struct TidegateServerBuilder {
    config: ServerConfig,
    reap_interval: Option<Duration>,
}

impl TidegateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            reap_interval: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the starting inactivity allowance.
    pub fn expiry_secs(mut self, secs: u64) -> Self {
        self.config.expiry_secs = secs;
        self
    }

    /// Sets the framing limits.
    pub fn frame_config(mut self, frame: FrameConfig) -> Self {
        self.config.frame = frame;
        self
    }

    /// Overrides `reap_interval_secs` with a finer interval.
    pub fn reap_interval(mut self, every: Duration) -> Self {
        self.reap_interval = Some(every.max(Duration::from_millis(1)));
        self
    }

    /// Validates the config, binds the listener, and returns the server.
    pub async fn build<D: Dispatcher>(
        self,
        dispatcher: D,
    ) -> Result<TidegateServer<D>, TidegateError> {
        self.config.validate()?;

        let transport = TcpTransport::bind(&self.config.bind_addr).await?;
        let reap_interval = self.reap_interval.unwrap_or(Duration::from_secs(
            self.config.reap_interval_secs,
        ));

        let state = Arc::new(ServerState {
            sessions: Arc::new(Mutex::new(SessionManager::new())),
            dispatcher,
            expiry: ExpiryThreshold::new(self.config.expiry_secs),
            frame: self.config.frame,
        });

        Ok(TidegateServer {
            transport,
            state,
            reap_interval,
        })
    }
}

impl Default for TidegateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tidegate server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TidegateServer<D: Dispatcher> {
    transport: TcpTransport,
    state: Arc<ServerState<D>>,
    reap_interval: Duration,
}

impl<D: Dispatcher> TidegateServer<D> {
    /// Creates a new builder.
    pub fn builder() -> TidegateServerBuilder {
        TidegateServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The live expiry threshold. Setting it affects the next sweep.
    pub fn expiry(&self) -> ExpiryThreshold {
        self.state.expiry.clone()
    }

    /// A handle that stops [`run`](Self::run) from another task.
    ///
    /// Shutting down stops accepting and the expiry reaper; sessions that
    /// are already open keep running until they end on their own.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.transport.shutdown_handle()
    }

    /// A probe reporting how many sessions are currently registered.
    pub fn session_count(&self) -> SessionCount {
        SessionCount {
            sessions: Arc::clone(&self.state.sessions),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Starts the expiry reaper, then accepts connections and spawns a
    /// handler task for each one. Returns once the transport is shut down
    /// through a [`shutdown_handle`](Self::shutdown_handle).
    pub async fn run(mut self) -> Result<(), TidegateError> {
        tracing::info!(
            expiry_secs = self.state.expiry.get(),
            "Tidegate server running"
        );

        let reaper = tokio::spawn(reaper::run(
            Arc::clone(&self.state.sessions),
            self.state.expiry.clone(),
            self.reap_interval,
        ));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "session ended with error"
                            );
                        }
                    });
                }
                Err(TransportError::Shutdown) => {
                    tracing::info!("transport shut down, accept loop exiting");
                    reaper.abort();
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Cloneable view of the live session count, usable after
/// [`TidegateServer::run`] consumed the server.
#[derive(Clone)]
pub struct SessionCount {
    sessions: Arc<Mutex<SessionManager<TcpConnection>>>,
}

impl SessionCount {
    /// Number of sessions registered right now.
    pub async fn get(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
