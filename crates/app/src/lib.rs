//! # roomwatch-app
//!
//! Application layer — use-cases, shared state and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `LinkTransport` / `LinkConnection` — line-oriented channel to the device
//!   - `PayloadLog` — append-only history of raw device payloads
//! - Own the **device state** (`StateStore`) and its change fan-out (`EventBus`)
//! - Drive the device link (`LinkDriver`): handshake, timeouts, reconnects
//! - Define **driving/inbound** use-cases:
//!   - `IngestCoordinator` — decode and apply device payloads
//!   - `CommandDispatcher` — light and override commands with the safety rule
//!
//! ## Dependency rule
//! Depends on `roomwatch-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod link;
pub mod occupancy;
pub mod ports;
pub mod services;
pub mod state_store;

#[cfg(test)]
mod testing;
