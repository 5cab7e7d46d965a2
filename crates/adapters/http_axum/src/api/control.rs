//! Light and override control.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_domain::command::LightCommand;

use crate::api::snapshot::StateView;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LightRequest {
    pub state: LightCommand,
    #[serde(default)]
    pub manual_override: bool,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub enable: bool,
}

/// `POST /api/light` — switch the light, subject to the occupancy rule.
pub async fn light<T, L>(
    State(state): State<AppState<T, L>>,
    Json(request): Json<LightRequest>,
) -> Result<Json<StateView>, ApiError>
where
    T: LinkTransport,
    L: PayloadLog,
{
    let updated = state
        .dispatcher
        .issue_light_command(request.state, request.manual_override)
        .await?;
    Ok(Json(StateView::build(&state, updated)))
}

/// `POST /api/override` — enable or disable the manual override.
pub async fn toggle_override<T, L>(
    State(state): State<AppState<T, L>>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<StateView>, ApiError>
where
    T: LinkTransport,
    L: PayloadLog,
{
    let updated = state
        .dispatcher
        .issue_override_toggle(request.enable)
        .await?;
    Ok(Json(StateView::build(&state, updated)))
}
