pub mod api;
pub mod background;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod realtime;
pub mod state;

use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use crate::api::router::create_router;
use crate::background::start_outbox_worker;
use crate::config::Config;
use crate::infra::factory::bootstrap_state;

const LOG_DIR: &str = "./logs";

/// Pretty stdout driven by `RUST_LOG`, plus a daily JSON file that always
/// keeps this crate at debug with the enclosing request span attached.
pub fn init_logging() -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(
        tracing_appender::rolling::daily(LOG_DIR, "booking-core.log"),
    );

    let json_file = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("info,home_services_booking=debug"));

    let console = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    tracing_subscriber::registry()
        .with(console)
        .with(json_file)
        .init();

    info!(dir = LOG_DIR, "Logging initialized");
    guard
}

pub async fn run() -> std::io::Result<()> {
    let _guard = init_logging();

    let config = Config::from_env();
    let state = Arc::new(bootstrap_state(&config).await);

    tokio::spawn(start_outbox_worker(state.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        port = config.port,
        timezone = %config.business_timezone,
        "Booking core listening"
    );
    axum::serve(listener, create_router(state)).await
}
