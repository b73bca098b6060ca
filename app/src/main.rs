//! CampusHub HTTP server.
//!
//! Wires the in-memory event store and bus to the application façade and
//! serves the API.

use campushub::api;
use campushub::app::CampusHub;
use campushub::config::Config;
use campushub::notifier::TracingNotifier;
use campushub_core::environment::SystemClock;
use campushub_testing::{InMemoryEventBus, InMemoryEventStore};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before reading configuration
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campushub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CampusHub server");

    let config = Config::from_env();

    let event_store = Arc::new(InMemoryEventStore::new());
    let event_bus = Arc::new(InMemoryEventBus::new());
    let hub = Arc::new(CampusHub::new(
        event_store,
        event_bus,
        Arc::new(SystemClock),
        Arc::new(TracingNotifier),
    ));

    let app = api::router(hub);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
