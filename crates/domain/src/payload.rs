//! Device payload decoding and field coercion.
//!
//! The device sends one JSON object per line. Every field is optional and
//! absence means "unchanged". Boolean fields accept native booleans as well
//! as the case-insensitive tokens `open`/`on` and `closed`/`off`. A field of
//! the wrong type is rejected on its own ([`FieldTypeError`]); the rest of
//! the payload still applies. Unknown fields are kept in [`IngestPayload::raw`].

use serde_json::{Map, Value};

use crate::error::{DecodeError, FieldTypeError, json_type_name};
use crate::time::Timestamp;

/// Wire name of the door field.
pub const DOOR: &str = "door";
/// Wire name of the light field.
pub const LIGHT: &str = "light";
/// Wire name of the presence field.
pub const USER_PRESENT: &str = "user_present";
/// Wire name of the luminosity field.
pub const LUMINOSITY: &str = "luminosity";
/// Wire name of the manual-override field.
pub const MANUAL_OVERRIDE: &str = "manual_override";
/// Key stamped on every ingested payload with the receipt time.
pub const RECEIVED_AT: &str = "received_at";
/// Optional key a sender may use to identify itself.
pub const SOURCE: &str = "source";

/// Sparse set of canonical field values. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    pub door_open: Option<bool>,
    pub light_on: Option<bool>,
    pub occupied: Option<bool>,
    pub luminosity: Option<f64>,
    pub manual_override: Option<bool>,
}

impl FieldUpdate {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.door_open.is_none()
            && self.light_on.is_none()
            && self.occupied.is_none()
            && self.luminosity.is_none()
            && self.manual_override.is_none()
    }
}

/// A decoded device message.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestPayload {
    /// Canonical values of the recognised fields.
    pub update: FieldUpdate,
    /// Fields that were present but carried an unsupported value.
    pub field_errors: Vec<FieldTypeError>,
    /// The original object, unknown fields included.
    pub raw: Map<String, Value>,
}

impl IngestPayload {
    /// Decode one newline-delimited message.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the bytes are not a JSON object.
    pub fn from_line(line: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(line.trim_ascii())?;
        Self::from_value(value)
    }

    /// Decode an already parsed JSON value (e.g. a relay push).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NotAnObject`] unless `value` is an object.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let raw = match value {
            Value::Object(raw) => raw,
            other => return Err(DecodeError::NotAnObject(json_type_name(&other))),
        };

        let mut field_errors = Vec::new();
        let update = FieldUpdate {
            door_open: take_bool(&raw, DOOR, &mut field_errors),
            light_on: take_bool(&raw, LIGHT, &mut field_errors),
            occupied: take_bool(&raw, USER_PRESENT, &mut field_errors),
            luminosity: take_number(&raw, LUMINOSITY, &mut field_errors),
            manual_override: take_bool(&raw, MANUAL_OVERRIDE, &mut field_errors),
        };

        Ok(Self {
            update,
            field_errors,
            raw,
        })
    }

    /// Self-reported sender, when the payload carries a `source` string.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.raw.get(SOURCE).and_then(Value::as_str)
    }

    /// Record the receipt time in the raw payload.
    pub fn stamp_received(&mut self, at: Timestamp) {
        self.raw
            .insert(RECEIVED_AT.to_string(), Value::String(at.to_rfc3339()));
    }
}

/// Coerce a heterogeneous boolean encoding into a canonical boolean.
#[must_use]
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(token) => {
            let token = token.trim();
            if token.eq_ignore_ascii_case("open") || token.eq_ignore_ascii_case("on") {
                Some(true)
            } else if token.eq_ignore_ascii_case("closed") || token.eq_ignore_ascii_case("off") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn take_bool(
    raw: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldTypeError>,
) -> Option<bool> {
    let value = present(raw, field)?;
    let coerced = coerce_bool(value);
    if coerced.is_none() {
        errors.push(FieldTypeError {
            field,
            found: value.to_string(),
        });
    }
    coerced
}

fn take_number(
    raw: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldTypeError>,
) -> Option<f64> {
    let value = present(raw, field)?;
    let number = value.as_f64();
    if number.is_none() {
        errors.push(FieldTypeError {
            field,
            found: value.to_string(),
        });
    }
    number
}

fn present<'a>(raw: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    raw.get(field).filter(|value| !value.is_null())
}
