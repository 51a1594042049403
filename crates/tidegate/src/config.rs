//! Server configuration.
//!
//! Loaded from JSON. Every field has a default, so a config file only
//! needs the keys it wants to change:
//!
//! ```json
//! {
//!     "bind_addr": "0.0.0.0:7000",
//!     "expiry_secs": 120,
//!     "frame": { "max_frame_len": 65536 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tidegate_protocol::FrameConfig;

use crate::TidegateError;

/// Configuration for a [`TidegateServer`](crate::TidegateServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: String,

    /// Seconds of inbound silence after which a session counts as expired.
    ///
    /// Only the starting value; it can be changed while the server runs
    /// through [`TidegateServer::expiry`](crate::TidegateServer::expiry).
    pub expiry_secs: u64,

    /// How often the reaper sweeps for expired sessions. Must be >= 1.
    pub reap_interval_secs: u64,

    /// Framing limits applied to every session.
    pub frame: FrameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7000".to_string(),
            expiry_secs: 300,
            reap_interval_secs: 30,
            frame: FrameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, TidegateError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TidegateError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| {
            TidegateError::ConfigIo {
                path: path.display().to_string(),
                source,
            }
        })?;
        Self::from_json_str(&json)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), TidegateError> {
        if self.reap_interval_secs == 0 {
            return Err(TidegateError::InvalidConfig(
                "reap_interval_secs must be at least 1".into(),
            ));
        }
        if self.frame.max_frame_len == Some(0) {
            return Err(TidegateError::InvalidConfig(
                "frame.max_frame_len must allow the 4-byte message id".into(),
            ));
        }
        Ok(())
    }
}
