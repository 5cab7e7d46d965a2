//! Control commands sent to the device.
//!
//! Wire format: one JSON object per line,
//! `{"action": "light_on" | "light_off" | "toggle_override" | "status", "manual_override": bool}`.

use serde::{Deserialize, Serialize};

/// Requested light state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightCommand {
    On,
    Off,
}

impl LightCommand {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Action understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    LightOn,
    LightOff,
    ToggleOverride,
    Status,
}

/// A command serialised onto the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub action: CommandAction,
    pub manual_override: bool,
}

impl DeviceCommand {
    /// Status request; the device answers with a full payload.
    #[must_use]
    pub fn status() -> Self {
        Self {
            action: CommandAction::Status,
            manual_override: false,
        }
    }

    /// Switch the light.
    #[must_use]
    pub fn light(command: LightCommand, manual_override: bool) -> Self {
        let action = match command {
            LightCommand::On => CommandAction::LightOn,
            LightCommand::Off => CommandAction::LightOff,
        };
        Self {
            action,
            manual_override,
        }
    }

    /// Set the manual override flag on the device.
    #[must_use]
    pub fn override_toggle(enable: bool) -> Self {
        Self {
            action: CommandAction::ToggleOverride,
            manual_override: enable,
        }
    }

    /// Encode as one newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns a serialisation error (never expected for this plain struct).
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
