//! Configuration structures.
//!
//! Configuration is loaded from a JSON file and overridden by CLI flags or
//! environment variables in the server binary. Nothing here is global: the
//! loaded `Config` is handed to each component that needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Hub connection defaults.
    #[serde(default)]
    pub hub: HubConfig,

    /// IPC transport configuration.
    #[serde(default)]
    pub ipc: IpcConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::validation(format!("invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IPC server bind address (TCP).
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:50061".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Defaults for reaching the hub. Request metadata may override endpoint and token.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the edge hub.
    pub endpoint: Option<String>,

    /// API token presented to the hub.
    pub api_token: Option<String>,

    /// JSON fixture used to seed the in-memory catalog.
    pub fixture_path: Option<PathBuf>,
}

/// IPC transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Maximum frame payload size in bytes.
    pub max_frame_bytes: u32,

    /// Maximum concurrent TCP connections. Connections beyond this limit
    /// are rejected.
    pub max_connections: usize,

    /// Read timeout per frame. Idle connections are dropped after this.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Write timeout per frame. Slow consumers are dropped after this.
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 5 * 1024 * 1024,
            max_connections: 256,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
        }
    }
}
