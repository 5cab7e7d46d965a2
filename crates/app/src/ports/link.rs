//! Device link port — the byte channel to the device.
//!
//! A transport knows how to open a connection (serial port, HTTP relay, …)
//! and perform its handshake. The [`LinkDriver`](crate::link::LinkDriver)
//! owns the resulting connection, serialises access to it and handles
//! timeouts and reconnection.

use std::future::Future;

use roomwatch_domain::error::LinkError;

/// Opens connections to the device.
pub trait LinkTransport: Send + Sync + 'static {
    /// An established, handshaken connection.
    type Connection: LinkConnection;

    /// Human readable target (port path, URL) for logs.
    fn describe(&self) -> String;

    /// Open the channel and perform the transport handshake.
    ///
    /// The driver bounds this call with its handshake timeout.
    fn open(&self) -> impl Future<Output = Result<Self::Connection, LinkError>> + Send;
}

/// An open, line-oriented channel to the device.
pub trait LinkConnection: Send + 'static {
    /// Wait for the next newline-delimited message, without the delimiter.
    ///
    /// Must be cancel-safe: bytes read before a cancellation are kept and
    /// the next call continues the same line.
    fn read_line(&mut self) -> impl Future<Output = Result<Vec<u8>, LinkError>> + Send;

    /// Write one complete, newline-terminated message.
    fn write_line(&mut self, line: &[u8]) -> impl Future<Output = Result<(), LinkError>> + Send;
}
