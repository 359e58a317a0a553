use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use tracing::info;

use crate::errors::{ApiError, DupcheckError, ResultExt};
use crate::server::app::AppState;
use crate::session::SessionToken;
use crate::store::{DOWNLOAD_CONTENT_TYPE, DOWNLOAD_FILENAME, NO_DOWNLOAD_MESSAGE};

const OPERATION: &str = "Error downloading file";

pub async fn download_duplicates(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = SessionToken::from_headers(&request_headers).ok_or_else(|| {
        ApiError::new(
            OPERATION,
            DupcheckError::NotFound(NO_DOWNLOAD_MESSAGE.to_string()),
        )
    })?;

    let file = state.store.retrieve(&session).await.during(OPERATION)?;
    info!(session = %session, "Serving {}", file.path.display());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(DOWNLOAD_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME))
            .map_err(|e| ApiError::new(OPERATION, DupcheckError::Internal(e.to_string())))?,
    );

    Ok((headers, file.content))
}
