//! Relay push endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;

use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_app::services::ingest_coordinator::IngestSource;
use roomwatch_domain::error::{DecodeError, RoomwatchError};
use roomwatch_domain::time::Timestamp;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PushAck {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: Timestamp,
    /// Fields that were ignored because of their value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<String>,
}

/// `POST /api/data` — apply a device payload pushed by a relay.
///
/// The body must be a JSON object; anything else is a `400`.
pub async fn push<T, L>(
    State(state): State<AppState<T, L>>,
    body: Bytes,
) -> Result<Json<PushAck>, ApiError>
where
    T: LinkTransport,
    L: PayloadLog,
{
    let value: Value =
        serde_json::from_slice(&body).map_err(|err| RoomwatchError::from(DecodeError::from(err)))?;
    let report = state.ingest.ingest_payload(value, IngestSource::Push)?;

    Ok(Json(PushAck {
        status: "success",
        message: "Data received",
        timestamp: report.received_at,
        field_errors: report
            .field_errors
            .iter()
            .map(ToString::to_string)
            .collect(),
    }))
}
