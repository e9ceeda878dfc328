//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scenesync_core::SceneSyncError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested folder or file does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error raised by the matching or verification engines
    #[error("Scene Sync error: {0}")]
    SceneSync(#[from] SceneSyncError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SceneSync(ref e) => match e {
                SceneSyncError::Configuration(_) => StatusCode::BAD_REQUEST,
                SceneSyncError::VerificationInput(_)
                | SceneSyncError::Store(_)
                | SceneSyncError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SceneSyncError::FolderUnreadable { .. } => StatusCode::NOT_FOUND,
                SceneSyncError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    StatusCode::NOT_FOUND
                }
                SceneSyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                SceneSyncError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::SceneSync(ref e) => match e {
                SceneSyncError::Configuration(_) => "INVALID_CONFIGURATION",
                SceneSyncError::FolderUnreadable { .. } => "FOLDER_UNREADABLE",
                SceneSyncError::VerificationInput(_) => "INVALID_VERIFICATION_INPUT",
                SceneSyncError::Store(_) => "MALFORMED_FILE",
                SceneSyncError::Extraction(_) => "IMAGE_READ_ERROR",
                SceneSyncError::Cancelled => "CANCELLED",
                SceneSyncError::Io(_) => "IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Filesystem details stay in the logs
            Self::SceneSync(SceneSyncError::FolderUnreadable { .. }) => {
                "Folder not found or unreadable".to_string()
            }
            Self::SceneSync(SceneSyncError::Io(_)) => "File system error".to_string(),
            Self::SceneSync(e) => e.to_string(),
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::SceneSync(_) => "scenesync",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
