//! Serial port transport.

use std::time::Duration;

use tokio_serial::{SerialPortBuilderExt, SerialStream};

use roomwatch_app::ports::LinkTransport;
use roomwatch_domain::command::DeviceCommand;
use roomwatch_domain::error::LinkError;

use crate::channel::LineChannel;
use crate::config::SerialConfig;
use crate::error::SerialError;

/// An open, handshaken serial session.
pub type SerialConnection = LineChannel<SerialStream>;

/// Opens the device's serial port.
#[derive(Debug, Clone)]
pub struct SerialTransport {
    config: SerialConfig,
}

impl SerialTransport {
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl LinkTransport for SerialTransport {
    type Connection = SerialConnection;

    fn describe(&self) -> String {
        format!("{}@{}", self.config.path, self.config.baud_rate)
    }

    async fn open(&self) -> Result<Self::Connection, LinkError> {
        let port = tokio_serial::new(&self.config.path, self.config.baud_rate)
            .open_native_async()
            .map_err(|source| SerialError::Open {
                path: self.config.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.config.path, "serial port opened");

        tokio::time::sleep(Duration::from_millis(self.config.reset_delay_ms)).await;

        let request = DeviceCommand::status().to_line().map_err(LinkError::io)?;
        let mut channel = LineChannel::new(port);
        channel.handshake(&request).await?;
        Ok(channel)
    }
}
