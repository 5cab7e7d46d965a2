//! Transport selected at startup from the `link.mode` setting.

use roomwatch_adapter_relay::{RelayConnection, RelayError, RelayTransport};
use roomwatch_adapter_serial::{SerialConnection, SerialTransport};
use roomwatch_app::ports::{LinkConnection, LinkTransport};
use roomwatch_domain::error::LinkError;

use crate::config::{Config, LinkMode};

/// The configured way of reaching the device.
#[derive(Debug)]
pub enum DeviceTransport {
    Serial(SerialTransport),
    Relay(RelayTransport),
    /// Every open fails; used when only relay pushes are expected.
    Disabled,
}

impl DeviceTransport {
    /// Build the transport named by `config.link.mode`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the relay HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        Ok(match config.link.mode {
            LinkMode::Serial => Self::Serial(SerialTransport::new(config.serial.clone())),
            LinkMode::Relay => Self::Relay(RelayTransport::new(&config.relay)?),
            LinkMode::Disabled => Self::Disabled,
        })
    }
}

impl LinkTransport for DeviceTransport {
    type Connection = DeviceConnection;

    fn describe(&self) -> String {
        match self {
            Self::Serial(inner) => inner.describe(),
            Self::Relay(inner) => inner.describe(),
            Self::Disabled => "disabled".to_string(),
        }
    }

    async fn open(&self) -> Result<DeviceConnection, LinkError> {
        match self {
            Self::Serial(inner) => inner.open().await.map(DeviceConnection::Serial),
            Self::Relay(inner) => inner.open().await.map(DeviceConnection::Relay),
            Self::Disabled => Err(LinkError::unavailable(
                "disabled",
                "device link disabled by configuration",
            )),
        }
    }
}

pub enum DeviceConnection {
    Serial(SerialConnection),
    Relay(RelayConnection),
}

impl LinkConnection for DeviceConnection {
    async fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        match self {
            Self::Serial(inner) => inner.read_line().await,
            Self::Relay(inner) => inner.read_line().await,
        }
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        match self {
            Self::Serial(inner) => inner.write_line(line).await,
            Self::Relay(inner) => inner.write_line(line).await,
        }
    }
}
