//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod control;
#[allow(clippy::missing_errors_doc)]
pub mod data;
pub mod events;
pub mod snapshot;
pub mod stats;

use axum::Router;
use axum::routing::{get, post};

use roomwatch_app::ports::{LinkTransport, PayloadLog};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<T, L>() -> Router<AppState<T, L>>
where
    T: LinkTransport,
    L: PayloadLog,
{
    Router::new()
        .route("/state", get(snapshot::get::<T, L>))
        .route("/events/stream", get(events::stream::<T, L>))
        .route("/events/recent", get(events::recent::<T, L>))
        .route("/data", post(data::push::<T, L>))
        .route("/light", post(control::light::<T, L>))
        .route("/override", post(control::toggle_override::<T, L>))
        .route("/stats", get(stats::get::<T, L>))
}
