//! Serial link configuration.

use serde::Deserialize;

/// Configuration for the serial link.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub path: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Time the board needs after the port opens before it answers, in
    /// milliseconds. Most boards reset when the port is opened.
    pub reset_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            reset_delay_ms: 2000,
        }
    }
}
