//! # roomwatch-domain
//!
//! Pure domain model for the roomwatch device monitor.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error taxonomy, timestamps
//! - Define the **device state** record and its occupancy invariants
//! - Define **change events** (immutable snapshot-plus-delta records)
//! - Decode and coerce **device payloads** (newline-delimited JSON)
//! - Define the **control commands** sent to the device and link session records
//! - Model the **user directory** used to name occupants
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod event;
pub mod link;
pub mod payload;
pub mod state;
pub mod user;
