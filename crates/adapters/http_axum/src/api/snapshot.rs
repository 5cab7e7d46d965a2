//! Current device state.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_domain::link::LinkStatus;
use roomwatch_domain::state::DeviceState;
use roomwatch_domain::time::now;

use crate::state::AppState;

/// Device state as served to dashboards.
#[derive(Debug, Serialize)]
pub struct StateView {
    #[serde(flatten)]
    pub state: DeviceState,
    /// The device reported within the liveness window.
    pub arduino_connected: bool,
    pub link_status: LinkStatus,
    pub detected_user_name: Option<String>,
}

impl StateView {
    pub(crate) fn build<T: LinkTransport, L>(app: &AppState<T, L>, state: DeviceState) -> Self {
        let arduino_connected = state.is_device_alive(now(), app.settings.liveness_window);
        let detected_user_name = state
            .detected_user()
            .map(|id| app.store.directory().display_name(id));
        Self {
            state,
            arduino_connected,
            link_status: app.link.status(),
            detected_user_name,
        }
    }
}

/// `GET /api/state` — consistent snapshot of the device state.
pub async fn get<T, L>(State(state): State<AppState<T, L>>) -> Json<StateView>
where
    T: LinkTransport,
    L: PayloadLog,
{
    let snapshot = state.store.snapshot();
    Json(StateView::build(&state, snapshot))
}
