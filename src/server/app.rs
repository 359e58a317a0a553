use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::render::Pages;
use crate::store::DerivedFileStore;

use super::handlers::{cleanup, download, health, index, upload};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DerivedFileStore>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(store: Arc<DerivedFileStore>) -> Result<Self> {
        Ok(Self {
            store,
            pages: Arc::new(Pages::new()?),
        })
    }
}

pub fn create_app(state: AppState, config: &ServerConfig) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    let cors = match config.cors_origin.as_deref() {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<axum::http::HeaderValue>()
                .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
        ),
        None => cors.allow_origin(Any),
    };

    let app = Router::new()
        .route("/", get(index::show_form))
        .route("/upload", post(upload::upload_file))
        .route("/download_duplicates", get(download::download_duplicates))
        .route("/cleanup", post(cleanup::cleanup))
        .route("/health", get(health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state);

    Ok(app)
}
