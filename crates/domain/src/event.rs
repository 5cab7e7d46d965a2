//! Change event — an immutable, timestamped snapshot-plus-delta.
//!
//! One event is produced for every change to the [`DeviceState`]: device
//! ingest, control writes, occupancy edges and link connectivity flips.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::state::DeviceState;
use crate::time::{Timestamp, now};

/// What produced a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A device payload was applied.
    Update,
    /// Someone entered the room.
    Welcome,
    /// The most recent occupant left.
    Exit,
    /// The light was switched through the control path.
    LightControl,
    /// The manual override was changed through the control path.
    Override,
    /// The device link connected or dropped.
    Link,
    /// Current state handed to a new subscriber.
    InitialState,
}

impl ChangeKind {
    /// Wire name, as serialised.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Welcome => "welcome",
            Self::Exit => "exit",
            Self::LightControl => "light_control",
            Self::Override => "override",
            Self::Link => "link",
            Self::InitialState => "initial_state",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub id: EventId,
    pub kind: ChangeKind,
    pub timestamp: Timestamp,
    /// The delta: raw device payload, control request, or derived details.
    pub payload: serde_json::Value,
    /// State after the change.
    pub state: DeviceState,
}

impl ChangeEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(kind: ChangeKind, payload: serde_json::Value, state: DeviceState) -> Self {
        Self {
            id: EventId::new(),
            kind,
            timestamp: now(),
            payload,
            state,
        }
    }
}
