//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use roomwatch_app::event_bus::EventBus;
use roomwatch_app::link::LinkDriver;
use roomwatch_app::ports::{LinkTransport, PayloadLog};
use roomwatch_app::services::command_dispatcher::CommandDispatcher;
use roomwatch_app::services::ingest_coordinator::IngestCoordinator;
use roomwatch_app::state_store::StateStore;

/// HTTP-facing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// The device counts as alive if it reported within this window.
    pub liveness_window: Duration,
    /// Reconnect hint sent to SSE clients.
    pub sse_retry: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            liveness_window: Duration::from_secs(60),
            sse_retry: Duration::from_secs(10),
        }
    }
}

/// Application state shared across all axum handlers.
///
/// Generic over the link transport and the payload log to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`.
pub struct AppState<T: LinkTransport, L> {
    pub store: Arc<StateStore>,
    pub bus: EventBus,
    pub link: Arc<LinkDriver<T>>,
    pub ingest: Arc<IngestCoordinator<T, L>>,
    pub dispatcher: Arc<CommandDispatcher<T>>,
    pub settings: HttpSettings,
}

impl<T: LinkTransport, L> Clone for AppState<T, L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bus: self.bus.clone(),
            link: Arc::clone(&self.link),
            ingest: Arc::clone(&self.ingest),
            dispatcher: Arc::clone(&self.dispatcher),
            settings: self.settings,
        }
    }
}

impl<T, L> AppState<T, L>
where
    T: LinkTransport,
    L: PayloadLog,
{
    /// Wire the services around one store, bus and link driver.
    ///
    /// The returned state shares the coordinator, so the caller can spawn
    /// its link loop from `state.ingest`.
    pub fn new(
        store: Arc<StateStore>,
        bus: EventBus,
        link: Arc<LinkDriver<T>>,
        ingest: Arc<IngestCoordinator<T, L>>,
        settings: HttpSettings,
    ) -> Self {
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&link),
            Arc::clone(&store),
        ));
        Self {
            store,
            bus,
            link,
            ingest,
            dispatcher,
            settings,
        }
    }
}
