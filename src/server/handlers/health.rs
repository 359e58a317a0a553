use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::server::app::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "dupcheck",
        "version": env!("CARGO_PKG_VERSION"),
        "export_dir": state.store.export_dir().display().to_string(),
        "active_sessions": state.store.records().len()
    }))
}
