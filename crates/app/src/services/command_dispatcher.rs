//! Command dispatcher — control use-cases with the occupancy safety rule.

use std::sync::Arc;

use roomwatch_domain::command::{DeviceCommand, LightCommand};
use roomwatch_domain::error::{PolicyViolation, RoomwatchError};
use roomwatch_domain::state::DeviceState;

use crate::link::LinkDriver;
use crate::ports::LinkTransport;
use crate::state_store::{ControlWrite, StateStore};

/// Sends control commands to the device and mirrors them into the state.
pub struct CommandDispatcher<T: LinkTransport> {
    link: Arc<LinkDriver<T>>,
    store: Arc<StateStore>,
}

impl<T: LinkTransport> CommandDispatcher<T> {
    pub fn new(link: Arc<LinkDriver<T>>, store: Arc<StateStore>) -> Self {
        Self { link, store }
    }

    /// Switch the light.
    ///
    /// The override in effect is `override_requested` or the device's own
    /// manual override flag. Turning the light off in an occupied room
    /// without it is refused.
    ///
    /// # Errors
    ///
    /// Returns [`RoomwatchError::Policy`] when the safety rule refuses the
    /// command, or [`RoomwatchError::Link`] when it could not be sent. The
    /// state is untouched in both cases.
    pub async fn issue_light_command(
        &self,
        command: LightCommand,
        override_requested: bool,
    ) -> Result<DeviceState, RoomwatchError> {
        let current = self.store.snapshot();
        let override_active = override_requested || current.manual_override;
        if current.occupied && !override_active && command == LightCommand::Off {
            tracing::warn!("refusing to switch the light off in an occupied room");
            return Err(PolicyViolation::OccupiedRoomLightOff.into());
        }

        self.link
            .send(&DeviceCommand::light(command, override_active))
            .await?;

        let mut state = self
            .store
            .apply_control(ControlWrite::Light(command.is_on()));
        if override_requested && !state.manual_override {
            state = self.store.apply_control(ControlWrite::Override(true));
        }
        tracing::info!(light = ?command, manual_override = state.manual_override, "light command issued");
        Ok(state)
    }

    /// Enable or disable the manual override.
    ///
    /// # Errors
    ///
    /// Returns [`RoomwatchError::Link`] when the command could not be sent.
    pub async fn issue_override_toggle(&self, enable: bool) -> Result<DeviceState, RoomwatchError> {
        self.link
            .send(&DeviceCommand::override_toggle(enable))
            .await?;
        tracing::info!(enable, "manual override toggled");
        Ok(self.store.apply_control(ControlWrite::Override(enable)))
    }
}
