use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use tracing::debug;

use crate::errors::{ApiError, ResultExt};
use crate::server::app::AppState;
use crate::session::SessionToken;
use crate::store::CleanupOutcome;

pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(session) = SessionToken::from_headers(&headers) {
        let outcome = state
            .store
            .cleanup(&session)
            .await
            .during("Error during cleanup")?;
        if outcome == CleanupOutcome::NothingToRemove {
            debug!(session = %session, "Nothing to clean up");
        }
    }

    Ok((StatusCode::OK, "Cleanup successful"))
}
