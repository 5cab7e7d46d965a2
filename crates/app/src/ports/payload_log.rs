//! Payload log port — durable history of raw device payloads.

use std::future::Future;

use serde_json::{Map, Value};

use roomwatch_domain::error::RoomwatchError;
use roomwatch_domain::time::Timestamp;

/// One raw payload as received.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadRecord {
    pub received_at: Timestamp,
    /// Ingress name (`"link"`, `"push"`).
    pub ingress: &'static str,
    pub payload: Map<String, Value>,
}

/// Append-only sink for raw payloads.
///
/// Callers treat it as fire-and-forget: a failure here never rolls back or
/// blocks state application.
pub trait PayloadLog: Send + Sync + 'static {
    /// Persist one record.
    fn append(
        &self,
        record: PayloadRecord,
    ) -> impl Future<Output = Result<(), RoomwatchError>> + Send;
}

impl<T: PayloadLog> PayloadLog for std::sync::Arc<T> {
    fn append(
        &self,
        record: PayloadRecord,
    ) -> impl Future<Output = Result<(), RoomwatchError>> + Send {
        (**self).append(record)
    }
}
