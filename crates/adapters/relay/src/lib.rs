//! # roomwatch-adapter-relay
//!
//! Relay link adapter — used when the device is not wired to this host.
//!
//! A relay (another host on the network with the device attached) accepts
//! commands as JSON `POST` bodies and answers with the device's reply, if
//! any. Unsolicited device data is pushed by the relay to `POST /api/data`
//! and never travels over this adapter.
//!
//! ## Responsibilities
//! - Handshake by posting a `status` command and keeping the reply
//! - Forward every command line and queue the replies as incoming lines
//!
//! ## Dependency rule
//! Implements the `LinkTransport` / `LinkConnection` ports from `roomwatch-app`.

pub mod config;
pub mod error;
pub mod transport;

pub use config::RelayConfig;
pub use error::RelayError;
pub use transport::{RelayConnection, RelayTransport};
