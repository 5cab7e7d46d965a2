//! # roomwatch-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** (`/api/state`, `/api/light`, `/api/override`, `/api/stats`, …)
//! - Accept **relay pushes** of device payloads on `POST /api/data`
//! - Stream every state change to dashboards over **Server-Sent Events**
//! - Map application results and errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `roomwatch-app` (for services and port traits) and
//! `roomwatch-domain` (for types used in request/response mapping). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod test_support;
