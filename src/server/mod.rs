pub mod app;
pub mod handlers;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::ServerConfig;
use crate::store::{DerivedFileStore, InMemorySessionRecords};

pub async fn start_server(config: ServerConfig) -> Result<()> {
    let store = Arc::new(DerivedFileStore::new(
        config.export_dir.clone(),
        Arc::new(InMemorySessionRecords::new()),
    ));
    store.ensure_export_dir().await?;
    info!("Storing duplicate exports in {}", store.export_dir().display());

    if let Some(retention) = config.sweep.retention() {
        spawn_sweeper(store.clone(), retention, config.sweep.interval());
    }

    let state = app::AppState::new(store)?;
    let app = app::create_app(state, &config)?;

    log_routes();

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete exports older than `retention`
fn spawn_sweeper(store: Arc<DerivedFileStore>, retention: Duration, every: Duration) {
    info!(
        "Sweeping exports older than {}s every {}s",
        retention.as_secs(),
        every.as_secs()
    );
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            tracing::debug!("Running periodic export sweep");
            if let Err(e) = store.sweep(retention).await {
                tracing::error!("Export sweep failed: {}", e);
            }
        }
    });
}

fn log_routes() {
    info!("Endpoints:");
    info!("  GET  /                      - Upload form");
    info!("  POST /upload                - Find duplicate rows in a CSV (multipart field `file`)");
    info!("  GET  /download_duplicates   - Download this session's duplicates.csv");
    info!("  POST /cleanup               - Delete this session's export file");
    info!("  GET  /health                - Health check");
}
