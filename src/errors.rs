//! Error types for dupcheck
//!
//! Every operation returns a [`DupcheckError`]. Handlers wrap it in an
//! [`ApiError`] carrying the route's operation name, and the conversion to an
//! HTTP response happens once, in `impl IntoResponse for ApiError`.
//!
//! # Error Categories
//!
//! - **BadRequest**: the upload form was submitted without a usable file
//! - **PayloadTooLarge**: the upload exceeds the configured body limit
//! - **Parse**: the uploaded bytes are not a parsable CSV
//! - **NotFound**: no export file is associated with the session
//! - **Internal** / **Io**: anything else, including filesystem failures
//!
//! # Examples
//!
//! ```rust
//! use dupcheck::errors::DupcheckError;
//!
//! let err = DupcheckError::NotFound("No duplicate data".to_string());
//! assert!(err.is_not_found());
//! assert_eq!(err.error_code(), "NOT_FOUND");
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

/// Domain errors
#[derive(Error, Debug)]
pub enum DupcheckError {
    /// Missing file part or empty filename
    #[error("{0}")]
    BadRequest(String),

    /// Upload body over `max_upload_bytes`
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Uploaded content is not a parsable CSV
    #[error("{0}")]
    Parse(String),

    /// Nothing to download for this session
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure
    #[error("{0}")]
    Internal(String),

    /// IO operation failed
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl DupcheckError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DupcheckError::BadRequest(_)
                | DupcheckError::PayloadTooLarge(_)
                | DupcheckError::NotFound(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, DupcheckError::NotFound(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DupcheckError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DupcheckError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DupcheckError::NotFound(_) => StatusCode::NOT_FOUND,
            DupcheckError::Parse(_) | DupcheckError::Internal(_) | DupcheckError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code for logs and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            DupcheckError::BadRequest(_) => "BAD_REQUEST",
            DupcheckError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            DupcheckError::Parse(_) => "PARSE_ERROR",
            DupcheckError::NotFound(_) => "NOT_FOUND",
            DupcheckError::Internal(_) => "INTERNAL_ERROR",
            DupcheckError::Io(_) => "IO_ERROR",
        }
    }
}

impl From<csv::Error> for DupcheckError {
    fn from(err: csv::Error) -> Self {
        DupcheckError::Internal(err.to_string())
    }
}

/// Result type alias for dupcheck operations
pub type DupcheckResult<T> = Result<T, DupcheckError>;

/// A [`DupcheckError`] raised while serving a route.
///
/// `operation` prefixes the message of server-side failures, so a CSV that
/// fails to parse during upload reads `Error processing file: ...`.
#[derive(Debug)]
pub struct ApiError {
    pub operation: &'static str,
    pub error: DupcheckError,
}

impl ApiError {
    pub fn new(operation: &'static str, error: DupcheckError) -> Self {
        Self { operation, error }
    }

    pub fn message(&self) -> String {
        if self.error.is_client_error() {
            self.error.to_string()
        } else {
            format!("{}: {}", self.operation, self.error)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let message = self.message();
        if status.is_server_error() {
            error!(code = self.error.error_code(), "{}", message);
        } else {
            warn!(code = self.error.error_code(), "{}", message);
        }
        (status, message).into_response()
    }
}

/// Attach the route's operation name to a domain result
pub trait ResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for DupcheckResult<T> {
    fn during(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|error| ApiError::new(operation, error))
    }
}
