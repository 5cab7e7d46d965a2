//! HTTP relay transport.

use std::collections::VecDeque;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use roomwatch_app::ports::{LinkConnection, LinkTransport};
use roomwatch_domain::command::DeviceCommand;
use roomwatch_domain::error::LinkError;
use roomwatch_domain::payload::IngestPayload;

use crate::config::RelayConfig;
use crate::error::RelayError;

/// Reaches the device through an HTTP relay.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: Client,
    command_url: String,
}

impl RelayTransport {
    /// Build the transport and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(RelayError::Client)?;
        Ok(Self {
            client,
            command_url: config.command_url.clone(),
        })
    }
}

impl LinkTransport for RelayTransport {
    type Connection = RelayConnection;

    fn describe(&self) -> String {
        self.command_url.clone()
    }

    async fn open(&self) -> Result<RelayConnection, LinkError> {
        let mut connection = RelayConnection {
            client: self.client.clone(),
            command_url: self.command_url.clone(),
            replies: VecDeque::new(),
        };
        let request = DeviceCommand::status().to_line().map_err(LinkError::io)?;
        connection
            .post(request)
            .await
            .map_err(|err| LinkError::unavailable(&self.command_url, err))?;
        Ok(connection)
    }
}

/// An open relay session.
///
/// Replies to posted commands are queued and handed out by `read_line`; with
/// nothing queued, `read_line` waits until cancelled.
#[derive(Debug)]
pub struct RelayConnection {
    client: Client,
    command_url: String,
    replies: VecDeque<Vec<u8>>,
}

impl RelayConnection {
    async fn post(&mut self, line: Vec<u8>) -> Result<(), RelayError> {
        let body = self
            .client
            .post(&self.command_url)
            .header(CONTENT_TYPE, "application/json")
            .body(line)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(RelayError::Request)?
            .bytes()
            .await
            .map_err(RelayError::Request)?;

        if carries_device_fields(&body) {
            self.replies.push_back(body.to_vec());
        } else {
            tracing::debug!(bytes = body.len(), "relay reply carries no device payload");
        }
        Ok(())
    }
}

/// Relay acknowledgements such as `{"status":"success"}` are not device
/// data and must not refresh the device's liveness.
fn carries_device_fields(body: &[u8]) -> bool {
    IngestPayload::from_line(body)
        .is_ok_and(|payload| !payload.update.is_empty() || !payload.field_errors.is_empty())
}

impl LinkConnection for RelayConnection {
    async fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        match self.replies.pop_front() {
            Some(line) => Ok(line),
            None => std::future::pending().await,
        }
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        Ok(self.post(line.to_vec()).await?)
    }
}
