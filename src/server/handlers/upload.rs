use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::info;

use crate::dataset::Dataset;
use crate::detector::detect;
use crate::errors::{ApiError, DupcheckError, ResultExt};
use crate::server::app::AppState;
use crate::session::SessionToken;

const OPERATION: &str = "Error processing file";
const FILE_FIELD: &str = "file";

struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let upload = read_file_field(multipart).await?;

    let dataset = Dataset::from_csv(&upload.bytes).during(OPERATION)?;
    let duplicates = detect(&dataset);
    info!(
        file = %upload.name,
        rows = dataset.len(),
        duplicates = duplicates.len(),
        "Processed upload"
    );

    let existing = SessionToken::from_headers(&headers);
    let session = existing.unwrap_or_else(SessionToken::generate);

    state
        .store
        .save(session, &duplicates)
        .await
        .during(OPERATION)?;

    let page = state
        .pages
        .results(&upload.name, &dataset, &duplicates)
        .during(OPERATION)?;

    let mut response = Html(page).into_response();
    if existing.is_none() {
        let cookie = HeaderValue::from_str(&session.cookie())
            .map_err(|e| ApiError::new(OPERATION, DupcheckError::Internal(e.to_string())))?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    Ok(response)
}

/// Pull the `file` part out of the form. A request that is not multipart at
/// all is treated the same as one without the part.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedFile, ApiError> {
    let no_file_part =
        || ApiError::new(OPERATION, DupcheckError::BadRequest("No file part".to_string()));

    let mut multipart = multipart.map_err(|_| no_file_part())?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(ApiError::new(
                OPERATION,
                DupcheckError::BadRequest("No selected file".to_string()),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?
            .to_vec();

        return Ok(UploadedFile { name, bytes });
    }

    Err(no_file_part())
}

/// Body-limit violations keep their 413; any other broken form is a 400.
fn multipart_error(err: MultipartError) -> ApiError {
    let message = err.body_text();
    let error = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DupcheckError::PayloadTooLarge(message)
    } else {
        DupcheckError::BadRequest(message)
    };
    ApiError::new(OPERATION, error)
}
