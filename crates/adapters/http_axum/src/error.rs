//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use roomwatch_domain::error::RoomwatchError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`RoomwatchError`] to an HTTP response with appropriate status code.
pub struct ApiError(RoomwatchError);

impl From<RoomwatchError> for ApiError {
    fn from(err: RoomwatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RoomwatchError::Decode(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            RoomwatchError::Policy(err) => (StatusCode::CONFLICT, err.to_string()),
            RoomwatchError::Link(err) => {
                tracing::warn!(error = %err, "device link unavailable for request");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            RoomwatchError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
