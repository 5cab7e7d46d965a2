//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `roomwatch.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use roomwatch_adapter_http_axum::state::HttpSettings;
use roomwatch_adapter_relay::RelayConfig;
use roomwatch_adapter_serial::SerialConfig;
use roomwatch_adapter_storage_jsonl::JsonlConfig;
use roomwatch_app::event_bus::BusSettings;
use roomwatch_app::link::LinkSettings;
use roomwatch_app::services::ingest_coordinator::IngestSettings;
use roomwatch_domain::user::{Directory, User};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Which transport reaches the device, and its timings.
    pub link: LinkConfig,
    pub serial: SerialConfig,
    pub relay: RelayConfig,
    /// Event history and subscriber queues.
    pub bus: BusConfig,
    pub state: StateConfig,
    /// Raw payload history.
    pub storage: JsonlConfig,
    /// Known users, in registration order.
    pub users: Vec<User>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Reconnect hint sent to SSE clients, in milliseconds.
    pub sse_retry_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// How the device is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Direct serial connection.
    #[default]
    Serial,
    /// Commands through an HTTP relay; data pushed to `POST /api/data`.
    Relay,
    /// No link loop. Only relay pushes are ingested; commands fail with 503.
    Disabled,
}

impl FromStr for LinkMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "relay" => Ok(Self::Relay),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unknown link mode `{other}` (expected serial, relay or disabled)"
            ))),
        }
    }
}

/// Link driver timings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub mode: LinkMode,
    /// Bound on opening the channel and reading the first reply.
    pub handshake_timeout_ms: u64,
    /// Wait between two connection attempts.
    pub reconnect_backoff_ms: u64,
    /// Slice for each read wait.
    pub read_timeout_ms: u64,
    /// Idle time after which a `status` request is sent.
    pub status_interval_secs: u64,
}

/// Event bus sizing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub history_capacity: usize,
    pub subscriber_queue: usize,
    /// Silence after which SSE clients get a keepalive comment.
    pub keepalive_secs: u64,
}

/// State reporting.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// The device counts as alive if it reported within this window.
    pub liveness_window_secs: u64,
}

impl Config {
    /// Load configuration from `roomwatch.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("roomwatch.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("ROOMWATCH_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("ROOMWATCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("ROOMWATCH_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("ROOMWATCH_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("ROOMWATCH_LINK_MODE") {
            self.link.mode = val.parse()?;
        }
        if let Some(val) = var("ROOMWATCH_SERIAL_PORT") {
            self.serial.path = val;
        }
        if let Some(val) = var("ROOMWATCH_RELAY_URL") {
            self.relay.command_url = val;
        }
        if let Some(val) = var("ROOMWATCH_LOG_DIR") {
            self.storage.dir = PathBuf::from(val);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.bus.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "bus.history_capacity must be non-zero".to_string(),
            ));
        }
        if self.bus.subscriber_queue == 0 {
            return Err(ConfigError::Validation(
                "bus.subscriber_queue must be non-zero".to_string(),
            ));
        }
        if self.bus.keepalive_secs == 0 {
            return Err(ConfigError::Validation(
                "bus.keepalive_secs must be non-zero".to_string(),
            ));
        }
        if self.link.read_timeout_ms == 0
            || self.link.handshake_timeout_ms == 0
            || self.link.reconnect_backoff_ms == 0
            || self.link.status_interval_secs == 0
        {
            return Err(ConfigError::Validation(
                "link timeouts and intervals must be non-zero".to_string(),
            ));
        }
        match self.link.mode {
            LinkMode::Serial if self.serial.path.trim().is_empty() => Err(
                ConfigError::Validation("serial.path must be set in serial mode".to_string()),
            ),
            LinkMode::Relay if !self.relay.command_url.starts_with("http") => {
                Err(ConfigError::Validation(format!(
                    "relay.command_url must be an http(s) URL, got `{}`",
                    self.relay.command_url
                )))
            }
            _ => Ok(()),
        }
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn directory(&self) -> Directory {
        Directory::new(self.users.iter().cloned())
    }

    #[must_use]
    pub fn bus_settings(&self) -> BusSettings {
        BusSettings {
            history_capacity: self.bus.history_capacity,
            subscriber_queue: self.bus.subscriber_queue,
            idle_timeout: Duration::from_secs(self.bus.keepalive_secs),
        }
    }

    #[must_use]
    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            handshake_timeout: Duration::from_millis(self.link.handshake_timeout_ms),
            reconnect_backoff: Duration::from_millis(self.link.reconnect_backoff_ms),
        }
    }

    #[must_use]
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            read_timeout: Duration::from_millis(self.link.read_timeout_ms),
            status_interval: Duration::from_secs(self.link.status_interval_secs),
        }
    }

    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            liveness_window: Duration::from_secs(self.state.liveness_window_secs),
            sse_retry: Duration::from_millis(self.server.sse_retry_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            sse_retry_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "roomwatchd=info,roomwatch=info,tower_http=info".to_string(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::default(),
            handshake_timeout_ms: 5_000,
            reconnect_backoff_ms: 5_000,
            read_timeout_ms: 250,
            status_interval_secs: 30,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            subscriber_queue: 64,
            keepalive_secs: 30,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            liveness_window_secs: 60,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
