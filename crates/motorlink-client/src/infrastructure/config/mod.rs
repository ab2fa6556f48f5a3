//! TOML configuration for the client.
//!
//! ```toml
//! [connection]
//! url = "ws://127.0.0.1:8000/ws"
//! channel_capacity = 128
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so an empty file, a partial file, and no
//! file at all are all valid.  Command-line flags are applied on top with
//! [`ClientConfig::with_overrides`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The device URL is not a WebSocket URL.
    #[error("invalid device URL `{0}`: expected a ws:// or wss:// URL")]
    InvalidUrl(String),

    /// `channel_capacity` must allow at least one queued event.
    #[error("connection.channel_capacity must be at least 1")]
    ZeroChannelCapacity,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to connect and how much inbound traffic to buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Device WebSocket endpoint.
    #[serde(default = "default_url")]
    pub url: String,
    /// Capacity of the inbound event channel between transport and loop.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"motorlink_core=debug,info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_url() -> String {
    "ws://127.0.0.1:8000/ws".to_string()
}
fn default_channel_capacity() -> usize {
    128
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Loads and validates the config at `path`.  A missing file yields
    /// [`ClientConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system errors other than "not
    /// found", [`ConfigError::Parse`] for malformed TOML, and the validation
    /// errors of [`ClientConfig::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file at {}; using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::load`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies command-line overrides.  `None` keeps the file value.
    pub fn with_overrides(mut self, url: Option<String>, log_level: Option<String>) -> Self {
        if let Some(url) = url {
            self.connection.url = url;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        self
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] unless the URL starts with `ws://`
    /// or `wss://` and names a host, and [`ConfigError::ZeroChannelCapacity`]
    /// if the capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.connection.url.trim();
        let lower = url.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("ws://")
            .or_else(|| lower.strip_prefix("wss://"));
        match rest {
            Some(rest) if !rest.is_empty() && !rest.starts_with('/') => {}
            _ => return Err(ConfigError::InvalidUrl(self.connection.url.clone())),
        }

        if self.connection.channel_capacity == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
