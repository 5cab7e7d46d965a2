//! Relay link configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the relay link.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Endpoint accepting command bodies.
    pub command_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl RelayConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            command_url: "http://127.0.0.1:5001/command".to_string(),
            timeout_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.command_url, "http://127.0.0.1:5001/command");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let config: RelayConfig =
            toml::from_str(r#"command_url = "http://relay.local/cmd""#).unwrap();
        assert_eq!(config.command_url, "http://relay.local/cmd");
        assert_eq!(config.timeout_secs, 5);
    }
}
