//! Live event stream and retained history.

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use serde::Serialize;
use tokio_stream::{Stream, StreamExt};

use roomwatch_app::event_bus::Delivery;
use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_domain::event::ChangeEvent;

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of state changes.
///
/// Frames, in order: a `retry` hint, an `initial_state` event, the retained
/// history, then live events. A `: keepalive` comment is sent whenever the
/// bus stays idle for its timeout. Each event is JSON with its kind as the
/// SSE event name.
pub async fn stream<T, L>(
    State(state): State<AppState<T, L>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>>
where
    T: LinkTransport,
    L: PayloadLog,
{
    let subscription = state.bus.subscribe();
    tracing::debug!(subscriber = %subscription.id(), "SSE client attached");

    let head = tokio_stream::iter([
        Ok(Event::default().retry(state.settings.sse_retry)),
        frame(&state.store.initial_state()),
    ]);
    let live = futures::stream::unfold(subscription, |mut subscription| async move {
        let item = match subscription.next().await? {
            Delivery::Event(event) => frame(&event),
            Delivery::Keepalive => Ok(Event::default().comment("keepalive")),
        };
        Some((item, subscription))
    });

    Sse::new(head.chain(live))
}

fn frame(event: &ChangeEvent) -> Result<Event, axum::Error> {
    Event::default()
        .event(event.kind.as_str())
        .id(event.id.to_string())
        .json_data(event)
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub messages: Vec<ChangeEvent>,
}

/// `GET /api/events/recent` — retained history, oldest first.
pub async fn recent<T, L>(State(state): State<AppState<T, L>>) -> Json<RecentResponse>
where
    T: LinkTransport,
    L: PayloadLog,
{
    Json(RecentResponse {
        messages: state.bus.recent(),
    })
}
