//! Serial adapter error types.

use roomwatch_domain::error::{LinkError, RoomwatchError};

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The port could not be opened.
    #[error("failed to open serial port {path}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Reading from or writing to the port failed.
    #[error("serial I/O failure")]
    Io(#[source] std::io::Error),

    /// The device closed the stream.
    #[error("serial stream closed by device")]
    Closed,

    /// A line grew past the limit without a newline.
    #[error("serial line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

impl SerialError {
    /// Convert into a [`LinkError`] for propagation across the port boundary.
    pub fn into_domain(self) -> LinkError {
        match self {
            Self::Open { path, source } => LinkError::unavailable(path, source),
            other => LinkError::io(other),
        }
    }
}

impl From<SerialError> for LinkError {
    fn from(err: SerialError) -> Self {
        err.into_domain()
    }
}

impl From<SerialError> for RoomwatchError {
    fn from(err: SerialError) -> Self {
        RoomwatchError::Link(err.into_domain())
    }
}
