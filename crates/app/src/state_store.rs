//! State store — the single owner of the shared [`DeviceState`].
//!
//! All reads and writes go through one mutex with O(1) critical sections.
//! Events are published to the [`EventBus`] from inside the critical section
//! (publishing never blocks), so subscribers see events in mutation order.

use serde_json::{Value, json};

use parking_lot::Mutex;
use roomwatch_domain::error::FieldTypeError;
use roomwatch_domain::event::{ChangeEvent, ChangeKind};
use roomwatch_domain::payload::IngestPayload;
use roomwatch_domain::state::{DeviceState, OccupancyTransition};
use roomwatch_domain::time::now;
use roomwatch_domain::user::Directory;

use crate::event_bus::EventBus;
use crate::occupancy::{FirstDirectoryEntry, OccupancyResolver};

/// Direct write from the control path, bypassing payload coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlWrite {
    Light(bool),
    Override(bool),
}

/// Result of [`StateStore::apply_ingest`].
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// State after the payload was applied.
    pub state: DeviceState,
    /// Events published, in order: the `update`, then any `welcome`/`exit`.
    pub events: Vec<ChangeEvent>,
    /// Fields that were skipped.
    pub field_errors: Vec<FieldTypeError>,
}

/// Authoritative device state.
pub struct StateStore {
    state: Mutex<DeviceState>,
    bus: EventBus,
    directory: Directory,
    resolver: Box<dyn OccupancyResolver>,
}

impl StateStore {
    /// Create a store using the [`FirstDirectoryEntry`] occupancy strategy.
    #[must_use]
    pub fn new(bus: EventBus, directory: Directory) -> Self {
        Self::with_resolver(bus, directory, FirstDirectoryEntry)
    }

    /// Create a store with a custom occupancy strategy.
    #[must_use]
    pub fn with_resolver(
        bus: EventBus,
        directory: Directory,
        resolver: impl OccupancyResolver + 'static,
    ) -> Self {
        Self {
            state: Mutex::new(DeviceState::default()),
            bus,
            directory,
            resolver: Box::new(resolver),
        }
    }

    /// Apply a decoded device payload.
    ///
    /// Always publishes exactly one `update` event, plus a `welcome` when
    /// presence starts or an `exit` when it ends.
    pub fn apply_ingest(&self, payload: &IngestPayload) -> IngestOutcome {
        let delta = Value::Object(payload.raw.clone());

        let mut state = self.state.lock();
        let transition = state.apply_update(&payload.update, now());
        let derived = match transition {
            OccupancyTransition::Entered => {
                let user = self
                    .resolver
                    .resolve_entrant(&self.directory, state.occupant_ids());
                state.admit(user.id.clone());
                Some((
                    ChangeKind::Welcome,
                    json!({
                        "user_id": user.id,
                        "name": user.name,
                        "message": format!("Welcome, {}!", user.name),
                    }),
                ))
            }
            OccupancyTransition::Left => state.release().map(|user_id| {
                let name = self.directory.display_name(&user_id);
                (ChangeKind::Exit, json!({ "user_id": user_id, "name": name }))
            }),
            OccupancyTransition::Unchanged => None,
        };
        let snapshot = state.clone();

        let mut events = Vec::with_capacity(2);
        events.push(ChangeEvent::new(ChangeKind::Update, delta, snapshot.clone()));
        if let Some((kind, details)) = derived {
            events.push(ChangeEvent::new(kind, details, snapshot.clone()));
        }
        for event in &events {
            self.bus.publish(event.clone());
        }
        drop(state);

        if let Some(derived) = events.get(1) {
            tracing::info!(kind = %derived.kind, user = ?snapshot.detected_user(), "occupancy changed");
        }

        IngestOutcome {
            state: snapshot,
            events,
            field_errors: payload.field_errors.clone(),
        }
    }

    /// Apply a control-path write and publish its event.
    pub fn apply_control(&self, write: ControlWrite) -> DeviceState {
        let mut state = self.state.lock();
        let (kind, details) = match write {
            ControlWrite::Light(on) => {
                state.light_on = on;
                (
                    ChangeKind::LightControl,
                    json!({ "light": if on { "on" } else { "off" } }),
                )
            }
            ControlWrite::Override(enabled) => {
                state.manual_override = enabled;
                (ChangeKind::Override, json!({ "manual_override": enabled }))
            }
        };
        let snapshot = state.clone();
        self.bus
            .publish(ChangeEvent::new(kind, details, snapshot.clone()));
        snapshot
    }

    /// Record link connectivity. Publishes a `link` event only on a flip.
    pub fn set_link_connected(&self, connected: bool) -> Option<ChangeEvent> {
        let mut state = self.state.lock();
        if state.link_connected == connected {
            return None;
        }
        state.link_connected = connected;
        let event = ChangeEvent::new(
            ChangeKind::Link,
            json!({ "link_connected": connected }),
            state.clone(),
        );
        self.bus.publish(event.clone());
        Some(event)
    }

    /// Consistent copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.state.lock().clone()
    }

    /// `initial_state` event for a new subscriber. Not published.
    #[must_use]
    pub fn initial_state(&self) -> ChangeEvent {
        ChangeEvent::new(ChangeKind::InitialState, json!({}), self.snapshot())
    }

    #[must_use]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }
}
