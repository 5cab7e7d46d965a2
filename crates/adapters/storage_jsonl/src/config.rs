//! Payload history configuration.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Directory holding the daily files. Created on first write.
    pub dir: PathBuf,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}
