//! # roomwatch-adapter-storage-jsonl
//!
//! Durable payload history as JSON-lines files.
//!
//! ## Responsibilities
//! - Implement the `PayloadLog` port from `roomwatch-app`
//! - Append one JSON object per payload to `payloads-YYYY-MM-DD.jsonl`
//!   (UTC date of receipt) in the configured directory
//!
//! Retention and cleanup of old files are left to the host.
//!
//! ## Dependency rule
//! Depends on `roomwatch-app` (for the port trait) and `roomwatch-domain`.
//! The `app` and `domain` crates must never reference this adapter.

pub mod config;
pub mod error;
pub mod log;

pub use config::JsonlConfig;
pub use error::StorageError;
pub use log::JsonLinesLog;
