//! Stub ports for handler tests.

use std::sync::{Arc, Mutex};

use roomwatch_app::event_bus::EventBus;
use roomwatch_app::link::{LinkDriver, LinkSettings};
use roomwatch_app::ports::{LinkConnection, LinkTransport, PayloadLog, PayloadRecord};
use roomwatch_app::services::ingest_coordinator::{IngestCoordinator, IngestSettings};
use roomwatch_app::state_store::StateStore;
use roomwatch_domain::error::{LinkError, RoomwatchError};
use roomwatch_domain::user::{Directory, User};

use crate::state::{AppState, HttpSettings};

/// Transport whose connections accept every write and never send anything.
#[derive(Clone, Default)]
pub(crate) struct StubTransport {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl StubTransport {
    pub(crate) fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }
}

pub(crate) struct StubConnection {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl LinkTransport for StubTransport {
    type Connection = StubConnection;

    fn describe(&self) -> String {
        "stub".to_string()
    }

    async fn open(&self) -> Result<StubConnection, LinkError> {
        Ok(StubConnection {
            written: Arc::clone(&self.written),
        })
    }
}

impl LinkConnection for StubConnection {
    async fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        std::future::pending().await
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        self.written.lock().unwrap().push(line.to_vec());
        Ok(())
    }
}

pub(crate) struct NullLog;

impl PayloadLog for NullLog {
    async fn append(&self, _record: PayloadRecord) -> Result<(), RoomwatchError> {
        Ok(())
    }
}

/// State with a disconnected link.
pub(crate) fn test_state() -> (AppState<StubTransport, NullLog>, StubTransport) {
    let transport = StubTransport::default();
    let bus = EventBus::default();
    let store = Arc::new(StateStore::new(
        bus.clone(),
        Directory::new([User::new("alice", "Alice")]),
    ));
    let link = Arc::new(LinkDriver::new(transport.clone(), LinkSettings::default()));
    let ingest = Arc::new(IngestCoordinator::new(
        Arc::clone(&link),
        Arc::clone(&store),
        Arc::new(NullLog),
        IngestSettings::default(),
    ));
    let state = AppState::new(store, bus, link, ingest, HttpSettings::default());
    (state, transport)
}

/// State with an established link session.
pub(crate) async fn connected_state() -> (AppState<StubTransport, NullLog>, StubTransport) {
    let (state, transport) = test_state();
    state.link.connect().await.unwrap();
    (state, transport)
}
