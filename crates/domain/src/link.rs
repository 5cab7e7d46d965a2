//! Link session records.

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, now};

/// Connection state of the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// One connection attempt to the device.
///
/// Sessions are replaced, never mutated: every connect attempt and every
/// demotion produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSession {
    /// Monotonic attempt counter, starting at 1. Zero means "never attempted".
    pub id: u64,
    pub connected: bool,
    pub last_error: Option<String>,
    pub opened_at: Timestamp,
}

impl LinkSession {
    /// Placeholder before the first attempt.
    #[must_use]
    pub fn initial() -> Self {
        Self {
            id: 0,
            connected: false,
            last_error: None,
            opened_at: now(),
        }
    }

    /// A session that completed its handshake.
    #[must_use]
    pub fn established(id: u64) -> Self {
        Self {
            id,
            connected: true,
            last_error: None,
            opened_at: now(),
        }
    }

    /// A session that failed to open or was demoted.
    #[must_use]
    pub fn failed(id: u64, error: &impl std::fmt::Display) -> Self {
        Self {
            id,
            connected: false,
            last_error: Some(error.to_string()),
            opened_at: now(),
        }
    }
}
