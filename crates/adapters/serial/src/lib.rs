//! # roomwatch-adapter-serial
//!
//! Serial link adapter — the direct connection to the device.
//!
//! ## Responsibilities
//! - Open the configured serial port with [tokio-serial](https://docs.rs/tokio-serial)
//! - Perform the handshake: wait for the board to reset, send a `status`
//!   request and wait for the first reply line
//! - Frame the byte stream into newline-delimited messages
//!
//! ## Dependency rule
//! Implements the `LinkTransport` / `LinkConnection` ports from `roomwatch-app`.
//! Timeouts and reconnects are the link driver's job, not this crate's.

pub mod channel;
pub mod config;
pub mod error;
pub mod transport;

pub use channel::LineChannel;
pub use config::SerialConfig;
pub use error::SerialError;
pub use transport::{SerialConnection, SerialTransport};
