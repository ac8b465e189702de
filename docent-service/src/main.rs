use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::info;

mod api;
mod completion;
mod config;
mod db;
mod error;
mod extraction;
mod i18n;
mod prompts;
mod service;

use crate::db::Database;
use crate::service::DocentService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!("Starting Docent service v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(config::load_config()?);

    info!(
        host = %config.server.host,
        port = config.server.port,
        locale = %config.locale,
        "Configuration loaded"
    );

    // Ensure data directories exist
    std::fs::create_dir_all(config.storage.uploads_dir())?;

    // Initialize database
    let db_path = config.storage.db_path();
    let db = Arc::new(Database::open(&db_path)?);
    info!(path = %db_path.display(), "Database initialized");

    // Install the Prometheus metrics recorder
    let metrics = PrometheusBuilder::new().install_recorder()?;

    // Initialize the service
    let service = Arc::new(DocentService::new(db, config.clone())?);

    // Build the router
    let app = api::router(service.clone(), metrics);

    // Start the document processing worker (resumes any pending documents)
    DocentService::start_processing_worker(service);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docent_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
