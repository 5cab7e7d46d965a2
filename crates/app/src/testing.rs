//! In-memory doubles for the ports, shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

use roomwatch_domain::error::{LinkError, RoomwatchError};

use crate::ports::{LinkConnection, LinkTransport, PayloadLog, PayloadRecord};

/// What the next `open()` call does.
pub(crate) enum OpenScript {
    Fail,
    Hang,
    Connect(Vec<MockRead>),
}

/// What the next `read_line()` call does.
pub(crate) enum MockRead {
    Line(&'static str),
    Broken,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<OpenScript>,
    opened_at: Vec<Instant>,
    written: Vec<Vec<u8>>,
    fail_writes: bool,
}

/// Scripted transport. Once the script runs out, every open succeeds with
/// a connection that stays silent.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn scripted(script: impl IntoIterator<Item = OpenScript>) -> Self {
        let transport = Self::default();
        transport.state.lock().script.extend(script);
        transport
    }

    pub(crate) fn opened_at(&self) -> Vec<Instant> {
        self.state.lock().opened_at.clone()
    }

    pub(crate) fn written(&self) -> Vec<String> {
        self.state
            .lock()
            .written
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

impl LinkTransport for MockTransport {
    type Connection = MockConnection;

    fn describe(&self) -> String {
        "mock".to_string()
    }

    async fn open(&self) -> Result<MockConnection, LinkError> {
        let next = {
            let mut state = self.state.lock();
            state.opened_at.push(Instant::now());
            state.script.pop_front()
        };
        match next.unwrap_or(OpenScript::Connect(Vec::new())) {
            OpenScript::Fail => Err(LinkError::unavailable("mock", "no device")),
            OpenScript::Hang => std::future::pending().await,
            OpenScript::Connect(reads) => Ok(MockConnection {
                reads: reads.into(),
                state: Arc::clone(&self.state),
            }),
        }
    }
}

pub(crate) struct MockConnection {
    reads: VecDeque<MockRead>,
    state: Arc<Mutex<MockState>>,
}

impl LinkConnection for MockConnection {
    async fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        match self.reads.pop_front() {
            Some(MockRead::Line(line)) => Ok(line.as_bytes().to_vec()),
            Some(MockRead::Broken) => Err(LinkError::io("connection reset")),
            None => std::future::pending().await,
        }
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(LinkError::io("broken pipe"));
        }
        state.written.push(line.to_vec());
        Ok(())
    }
}

/// Payload log keeping records in memory.
#[derive(Default)]
pub(crate) struct MemoryLog {
    records: Mutex<Vec<PayloadRecord>>,
    fail: bool,
}

impl MemoryLog {
    pub(crate) fn failing() -> Self {
        Self {
            records: Mutex::default(),
            fail: true,
        }
    }

    pub(crate) fn records(&self) -> Vec<PayloadRecord> {
        self.records.lock().clone()
    }
}

impl PayloadLog for MemoryLog {
    async fn append(&self, record: PayloadRecord) -> Result<(), RoomwatchError> {
        if self.fail {
            return Err(RoomwatchError::Storage("disk full".into()));
        }
        self.records.lock().push(record);
        Ok(())
    }
}
