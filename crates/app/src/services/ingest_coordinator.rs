//! Ingest coordinator — turns device messages into state changes.
//!
//! Owns the link loop (connect, pump, reconnect) and is the single entry
//! point for payloads, whether they arrive over the link or are pushed by a
//! relay.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use roomwatch_domain::command::DeviceCommand;
use roomwatch_domain::error::{FieldTypeError, LinkError, RoomwatchError};
use roomwatch_domain::event::ChangeEvent;
use roomwatch_domain::payload::IngestPayload;
use roomwatch_domain::state::DeviceState;
use roomwatch_domain::time::{Timestamp, now};

use crate::link::LinkDriver;
use crate::ports::{LinkTransport, PayloadLog, PayloadRecord};
use crate::state_store::StateStore;

/// How a payload reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSource {
    /// Read from the device link.
    Link,
    /// Pushed over HTTP by a relay.
    Push,
}

impl IngestSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Push => "push",
        }
    }
}

/// Timing knobs for the link loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Slice for each `read_line` wait.
    pub read_timeout: Duration,
    /// Idle time after which a `status` request is sent.
    pub status_interval: Duration,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(250),
            status_interval: Duration::from_secs(30),
        }
    }
}

/// Counters exposed on the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub total_messages: u64,
    pub decode_failures: u64,
    pub field_errors: u64,
    pub last_seen: Option<Timestamp>,
    /// Message count per sender: the payload's `source`, else the ingress.
    pub by_source: BTreeMap<String, u64>,
}

/// Result of one successful ingest.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub received_at: Timestamp,
    pub state: DeviceState,
    pub events: Vec<ChangeEvent>,
    pub field_errors: Vec<FieldTypeError>,
}

/// Drives the link and applies every incoming payload.
pub struct IngestCoordinator<T: LinkTransport, L> {
    link: Arc<LinkDriver<T>>,
    store: Arc<StateStore>,
    log: Arc<L>,
    settings: IngestSettings,
    stats: Mutex<IngestStats>,
}

impl<T: LinkTransport, L: PayloadLog> IngestCoordinator<T, L> {
    pub fn new(
        link: Arc<LinkDriver<T>>,
        store: Arc<StateStore>,
        log: Arc<L>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            link,
            store,
            log,
            settings,
            stats: Mutex::default(),
        }
    }

    /// Run the link loop forever. Meant to be spawned and aborted on shutdown.
    pub async fn run(&self) {
        let mut delay = false;
        loop {
            self.link.establish(delay).await;
            self.store.set_link_connected(true);
            let err = self.pump().await;
            self.store.set_link_connected(false);
            tracing::warn!(error = %err, "device link lost, reconnecting");
            delay = true;
        }
    }

    /// Read and apply lines until the link fails.
    async fn pump(&self) -> LinkError {
        let mut next_status = Instant::now() + self.settings.status_interval;
        loop {
            match self.link.read_line(self.settings.read_timeout).await {
                Ok(Some(line)) => {
                    self.ingest_line(&line);
                    next_status = Instant::now() + self.settings.status_interval;
                }
                Ok(None) => {}
                Err(err) => return err,
            }

            if Instant::now() >= next_status {
                tracing::debug!("device idle, requesting status");
                if let Err(err) = self.link.send(&DeviceCommand::status()).await {
                    return err;
                }
                next_status = Instant::now() + self.settings.status_interval;
            }
        }
    }

    /// Decode and apply one raw line from the link.
    ///
    /// Undecodable lines are logged, counted and dropped. Must be called
    /// from within a Tokio runtime.
    pub fn ingest_line(&self, line: &[u8]) -> Option<IngestReport> {
        match IngestPayload::from_line(line) {
            Ok(payload) => Some(self.apply(payload, IngestSource::Link)),
            Err(err) => {
                self.stats.lock().decode_failures += 1;
                tracing::warn!(
                    error = %err,
                    line = %String::from_utf8_lossy(line),
                    "discarding undecodable device message"
                );
                None
            }
        }
    }

    /// Apply an already parsed payload. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RoomwatchError::Decode`] when `value` is not a JSON object.
    pub fn ingest_payload(
        &self,
        value: Value,
        source: IngestSource,
    ) -> Result<IngestReport, RoomwatchError> {
        match IngestPayload::from_value(value) {
            Ok(payload) => Ok(self.apply(payload, source)),
            Err(err) => {
                self.stats.lock().decode_failures += 1;
                tracing::warn!(error = %err, source = source.as_str(), "rejecting device payload");
                Err(err.into())
            }
        }
    }

    /// Snapshot of the ingest counters.
    #[must_use]
    pub fn stats(&self) -> IngestStats {
        self.stats.lock().clone()
    }

    fn apply(&self, mut payload: IngestPayload, source: IngestSource) -> IngestReport {
        let received_at = now();
        payload.stamp_received(received_at);

        let outcome = self.store.apply_ingest(&payload);
        for err in &outcome.field_errors {
            tracing::warn!(field = err.field, found = %err.found, "ignoring field with unsupported value");
        }

        {
            let mut stats = self.stats.lock();
            stats.total_messages += 1;
            stats.field_errors += u64::try_from(outcome.field_errors.len()).unwrap_or(u64::MAX);
            stats.last_seen = Some(received_at);
            let sender = payload.source().unwrap_or(source.as_str()).to_string();
            *stats.by_source.entry(sender).or_default() += 1;
        }
        tracing::debug!(source = source.as_str(), events = outcome.events.len(), "payload applied");

        self.persist(PayloadRecord {
            received_at,
            ingress: source.as_str(),
            payload: payload.raw,
        });

        IngestReport {
            received_at,
            state: outcome.state,
            events: outcome.events,
            field_errors: outcome.field_errors,
        }
    }

    fn persist(&self, record: PayloadRecord) {
        let log = Arc::clone(&self.log);
        tokio::spawn(async move {
            if let Err(err) = log.append(record).await {
                tracing::warn!(error = %err, "failed to persist device payload");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use crate::link::LinkSettings;
    use crate::testing::{MemoryLog, MockRead, MockTransport, OpenScript};
    use roomwatch_domain::event::ChangeKind;
    use roomwatch_domain::user::{Directory, User};
    use serde_json::json;

    struct Harness {
        coordinator: Arc<IngestCoordinator<MockTransport, MemoryLog>>,
        link: Arc<LinkDriver<MockTransport>>,
        store: Arc<StateStore>,
        bus: EventBus,
        log: Arc<MemoryLog>,
    }

    fn harness_with(transport: MockTransport, log: MemoryLog) -> Harness {
        let bus = EventBus::default();
        let store = Arc::new(StateStore::new(
            bus.clone(),
            Directory::new([User::new("alice", "Alice")]),
        ));
        let link = Arc::new(LinkDriver::new(transport, LinkSettings::default()));
        let log = Arc::new(log);
        let coordinator = Arc::new(IngestCoordinator::new(
            Arc::clone(&link),
            Arc::clone(&store),
            Arc::clone(&log),
            IngestSettings::default(),
        ));
        Harness {
            coordinator,
            link,
            store,
            bus,
            log,
        }
    }

    fn harness() -> Harness {
        harness_with(MockTransport::default(), MemoryLog::default())
    }

    async fn wait_for_records(log: &MemoryLog, count: usize) -> Vec<PayloadRecord> {
        for _ in 0..100 {
            let records = log.records();
            if records.len() >= count {
                return records;
            }
            tokio::task::yield_now().await;
        }
        log.records()
    }

    #[tokio::test]
    async fn should_apply_line_and_count_it() {
        let h = harness();

        let report = h
            .coordinator
            .ingest_line(b"{\"door\":\"open\",\"luminosity\":42}\n")
            .unwrap();

        assert!(report.state.door_open);
        assert_eq!(report.events.len(), 1);
        let stats = h.coordinator.stats();
        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.by_source.get("link"), Some(&1));
        assert_eq!(stats.last_seen, Some(report.received_at));
    }

    #[tokio::test]
    async fn should_discard_undecodable_line() {
        let h = harness();

        assert!(h.coordinator.ingest_line(b"{not json").is_none());
        assert!(h.coordinator.ingest_line(b"[1,2]").is_none());

        let stats = h.coordinator.stats();
        assert_eq!(stats.decode_failures, 2);
        assert_eq!(stats.total_messages, 0);
        assert_eq!(h.bus.stats().retained, 0);
    }

    #[tokio::test]
    async fn should_reject_non_object_push() {
        let h = harness();

        let err = h
            .coordinator
            .ingest_payload(json!("door open"), IngestSource::Push)
            .unwrap_err();

        assert!(matches!(err, RoomwatchError::Decode(_)));
        assert_eq!(h.coordinator.stats().decode_failures, 1);
    }

    #[tokio::test]
    async fn should_count_pushes_by_reported_source() {
        let h = harness();

        h.coordinator
            .ingest_payload(json!({"light": "on", "source": "relay-1"}), IngestSource::Push)
            .unwrap();
        h.coordinator
            .ingest_payload(json!({"light": "off"}), IngestSource::Push)
            .unwrap();

        let stats = h.coordinator.stats();
        assert_eq!(stats.by_source.get("relay-1"), Some(&1));
        assert_eq!(stats.by_source.get("push"), Some(&1));
    }

    #[tokio::test]
    async fn should_count_field_errors_but_apply_the_rest() {
        let h = harness();

        let report = h
            .coordinator
            .ingest_payload(json!({"door": [1], "light": true}), IngestSource::Push)
            .unwrap();

        assert_eq!(report.field_errors.len(), 1);
        assert!(report.state.light_on);
        assert_eq!(h.coordinator.stats().field_errors, 1);
    }

    #[tokio::test]
    async fn should_persist_stamped_payload() {
        let h = harness();

        h.coordinator.ingest_line(b"{\"door\":true}");

        let records = wait_for_records(&h.log, 1).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ingress, "link");
        assert!(records[0].payload.contains_key("received_at"));
        assert_eq!(records[0].payload["door"], true);
    }

    #[tokio::test]
    async fn should_apply_state_even_when_persistence_fails() {
        let h = harness_with(MockTransport::default(), MemoryLog::failing());

        let report = h.coordinator.ingest_line(b"{\"door\":true}").unwrap();
        tokio::task::yield_now().await;

        assert!(report.state.door_open);
        assert!(h.store.snapshot().door_open);
    }

    #[tokio::test(start_paused = true)]
    async fn should_track_link_connectivity_across_reconnects() {
        let transport = MockTransport::scripted([
            OpenScript::Connect(vec![MockRead::Broken]),
            OpenScript::Fail,
            OpenScript::Fail,
            OpenScript::Connect(vec![MockRead::Line("{\"door\":\"open\"}")]),
        ]);
        let h = harness_with(transport, MemoryLog::default());
        let coordinator = Arc::clone(&h.coordinator);
        let handle = tokio::spawn(async move { coordinator.run().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.link.attempts(), 1);
        assert!(!h.store.snapshot().link_connected);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.link.attempts(), 3);
        assert!(!h.store.snapshot().link_connected);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.link.attempts(), 4);
        let state = h.store.snapshot();
        assert!(state.link_connected);
        assert!(state.door_open);

        let link_flags: Vec<Value> = h
            .bus
            .recent()
            .into_iter()
            .filter(|event| event.kind == ChangeKind::Link)
            .map(|event| event.payload["link_connected"].clone())
            .collect();
        assert_eq!(link_flags, vec![json!(true), json!(false), json!(true)]);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn should_request_status_when_device_is_idle() {
        let transport = MockTransport::default();
        let h = harness_with(transport.clone(), MemoryLog::default());
        let coordinator = Arc::clone(&h.coordinator);
        let handle = tokio::spawn(async move { coordinator.run().await });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(transport.written().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let written = transport.written();
        assert_eq!(written.len(), 1);
        assert!(written[0].contains("\"status\""));

        handle.abort();
    }
}
