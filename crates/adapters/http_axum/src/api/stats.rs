//! Ingest, bus and link statistics.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use roomwatch_app::event_bus::BusStats;
use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_app::services::ingest_coordinator::IngestStats;
use roomwatch_domain::link::{LinkSession, LinkStatus};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LinkStats {
    pub status: LinkStatus,
    pub attempts: u64,
    pub session: LinkSession,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub ingest: IngestStats,
    pub bus: BusStats,
    pub link: LinkStats,
}

/// `GET /api/stats`
pub async fn get<T, L>(State(state): State<AppState<T, L>>) -> Json<StatsResponse>
where
    T: LinkTransport,
    L: PayloadLog,
{
    Json(StatsResponse {
        ingest: state.ingest.stats(),
        bus: state.bus.stats(),
        link: LinkStats {
            status: state.link.status(),
            attempts: state.link.attempts(),
            session: state.link.session(),
        },
    })
}
