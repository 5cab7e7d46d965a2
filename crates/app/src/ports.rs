//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the core services and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod link;
pub mod payload_log;

pub use link::{LinkConnection, LinkTransport};
pub use payload_log::{PayloadLog, PayloadRecord};
