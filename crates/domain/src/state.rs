//! Device state — the single shared record describing the room and the link.

use std::time::Duration;

use serde::Serialize;

use crate::id::UserId;
use crate::payload::FieldUpdate;
use crate::time::Timestamp;

/// Current view of the device and its environment.
///
/// `occupied` is the only presence flag. The occupant stack is derived from
/// its edges and is private so that `detected_user` is always
/// `occupant_ids.last()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    pub door_open: bool,
    pub light_on: bool,
    pub occupied: bool,
    pub luminosity: f64,
    pub manual_override: bool,
    pub link_connected: bool,
    pub last_update: Option<Timestamp>,
    occupant_ids: Vec<UserId>,
    detected_user: Option<UserId>,
}

/// How presence changed while applying an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyTransition {
    Unchanged,
    /// `occupied` flipped false → true.
    Entered,
    /// `occupied` flipped true → false.
    Left,
}

impl DeviceState {
    /// Users currently considered present, most recent entrant last.
    #[must_use]
    pub fn occupant_ids(&self) -> &[UserId] {
        &self.occupant_ids
    }

    /// Most recent entrant, present iff the occupant stack is non-empty.
    #[must_use]
    pub fn detected_user(&self) -> Option<&UserId> {
        self.detected_user.as_ref()
    }

    /// Apply the sparse update and report the presence edge, if any.
    ///
    /// Occupant bookkeeping is left to the caller ([`admit`](Self::admit) /
    /// [`release`](Self::release)) because choosing who entered is a strategy.
    pub fn apply_update(&mut self, update: &FieldUpdate, at: Timestamp) -> OccupancyTransition {
        if let Some(door_open) = update.door_open {
            self.door_open = door_open;
        }
        if let Some(light_on) = update.light_on {
            self.light_on = light_on;
        }
        if let Some(luminosity) = update.luminosity {
            self.luminosity = luminosity;
        }
        if let Some(manual_override) = update.manual_override {
            self.manual_override = manual_override;
        }
        self.last_update = Some(at);

        let Some(occupied) = update.occupied else {
            return OccupancyTransition::Unchanged;
        };
        let transition = match (self.occupied, occupied) {
            (false, true) => OccupancyTransition::Entered,
            (true, false) => OccupancyTransition::Left,
            _ => OccupancyTransition::Unchanged,
        };
        self.occupied = occupied;
        transition
    }

    /// Push an entrant onto the occupant stack.
    pub fn admit(&mut self, user: UserId) {
        self.detected_user = Some(user.clone());
        self.occupant_ids.push(user);
    }

    /// Pop the most recent entrant.
    pub fn release(&mut self) -> Option<UserId> {
        let left = self.occupant_ids.pop();
        self.detected_user = self.occupant_ids.last().cloned();
        left
    }

    /// Whether the device reported anything within `window` of `now`.
    #[must_use]
    pub fn is_device_alive(&self, now: Timestamp, window: Duration) -> bool {
        let Some(last) = self.last_update else {
            return false;
        };
        let Ok(window) = chrono::Duration::from_std(window) else {
            return true;
        };
        now.signed_duration_since(last) <= window
    }
}
