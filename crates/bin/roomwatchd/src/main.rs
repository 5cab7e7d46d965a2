//! # roomwatchd — roomwatch daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing` from the configured filter
//! - Pick the device transport (serial, relay or none)
//! - Construct the state store, event bus, link driver and payload log
//! - Spawn the link loop and serve the axum router
//! - Stop on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod transport;

use std::future::IntoFuture;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use roomwatch_adapter_http_axum::router;
use roomwatch_adapter_http_axum::state::AppState;
use roomwatch_adapter_storage_jsonl::JsonLinesLog;
use roomwatch_app::event_bus::EventBus;
use roomwatch_app::link::LinkDriver;
use roomwatch_app::services::ingest_coordinator::IngestCoordinator;
use roomwatch_app::state_store::StateStore;

use crate::config::{Config, LinkMode};
use crate::transport::DeviceTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Core
    let bus = EventBus::new(config.bus_settings());
    let store = Arc::new(StateStore::new(bus.clone(), config.directory()));
    let transport = DeviceTransport::from_config(&config)?;
    let link = Arc::new(LinkDriver::new(transport, config.link_settings()));
    let log = Arc::new(JsonLinesLog::new(&config.storage));
    let ingest = Arc::new(IngestCoordinator::new(
        Arc::clone(&link),
        Arc::clone(&store),
        log,
        config.ingest_settings(),
    ));

    // Link loop
    let link_task = if config.link.mode == LinkMode::Disabled {
        tracing::info!("device link disabled, only relay pushes are ingested");
        None
    } else {
        let ingest = Arc::clone(&ingest);
        Some(tokio::spawn(async move { ingest.run().await }))
    };

    // HTTP
    let state = AppState::new(store, bus, link, ingest, config.http_settings());
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, mode = ?config.link.mode, "roomwatchd listening");

    // SSE streams never end on their own, so a graceful drain would wait
    // forever. Stop serving as soon as the signal arrives.
    tokio::select! {
        served = axum::serve(listener, app).into_future() => served?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
    }

    if let Some(task) = link_task {
        task.abort();
    }
    Ok(())
}
