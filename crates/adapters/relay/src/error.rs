//! Relay adapter error types.

use roomwatch_domain::error::{LinkError, RoomwatchError};

/// Errors specific to the relay adapter.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed or the relay answered with an error status.
    #[error("relay request failed")]
    Request(#[source] reqwest::Error),
}

impl RelayError {
    /// Convert into a [`LinkError`] for propagation across the port boundary.
    pub fn into_domain(self) -> LinkError {
        LinkError::io(self)
    }
}

impl From<RelayError> for LinkError {
    fn from(err: RelayError) -> Self {
        err.into_domain()
    }
}

impl From<RelayError> for RoomwatchError {
    fn from(err: RelayError) -> Self {
        RoomwatchError::Link(err.into_domain())
    }
}
