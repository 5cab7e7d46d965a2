//! Application services — use-case implementations.
//!
//! Each service accepts its collaborators (link driver, state store, port
//! implementations) through its constructor, keeping this layer decoupled
//! from concrete adapters.

pub mod command_dispatcher;
pub mod ingest_coordinator;
