//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RoomwatchError`] via `#[from]`. Adapter errors that have no domain
//! meaning travel as [`RoomwatchError::Storage`] or inside a [`LinkError`].

use std::time::Duration;

/// Boxed source error used where the concrete type belongs to an adapter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for operations crossing the application boundary.
#[derive(Debug, thiserror::Error)]
pub enum RoomwatchError {
    /// A whole payload could not be decoded.
    #[error("decode error")]
    Decode(#[from] DecodeError),

    /// A control request was rejected by a safety rule.
    #[error("policy violation")]
    Policy(#[from] PolicyViolation),

    /// The device link failed or is not available.
    #[error("device link error")]
    Link(#[from] LinkError),

    /// Persistence or another infrastructure collaborator failed.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Failures of the device link. All of them are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The underlying resource (serial port, relay endpoint) could not be opened.
    #[error("link target {target} unavailable")]
    Unavailable {
        /// Human readable description of the target (port path, URL).
        target: String,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },

    /// The device did not answer within the handshake window.
    #[error("device did not respond within {0:?}")]
    Timeout(Duration),

    /// No session is currently established.
    #[error("device link not connected")]
    NotConnected,

    /// Reading from or writing to an established session failed.
    #[error("device link I/O failure")]
    IoFailure(#[source] BoxError),
}

impl LinkError {
    /// Build an [`IoFailure`](Self::IoFailure) from any error type.
    pub fn io(err: impl Into<BoxError>) -> Self {
        Self::IoFailure(err.into())
    }

    /// Build an [`Unavailable`](Self::Unavailable) error for `target`.
    pub fn unavailable(target: impl Into<String>, err: impl Into<BoxError>) -> Self {
        Self::Unavailable {
            target: target.into(),
            source: err.into(),
        }
    }
}

/// A whole message could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not valid JSON.
    #[error("payload is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// The JSON value is valid but not an object.
    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// A single field of a payload carried a value of the wrong type.
///
/// Scoped to one field: the rest of the payload still applies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}` has unsupported value {found}")]
pub struct FieldTypeError {
    /// Wire name of the offending field.
    pub field: &'static str,
    /// Compact rendering of the rejected value.
    pub found: String,
}

/// A control request rejected by a safety invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    /// Turning the light off while the room is occupied requires the override.
    #[error("cannot turn the light off while the room is occupied without manual override")]
    OccupiedRoomLightOff,
}

/// Name of a JSON value's type, for error messages.
#[must_use]
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
