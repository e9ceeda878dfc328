//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod download;
pub mod folders;
pub mod health;
pub mod inspect;
pub mod matching;
pub mod verify;

pub use crate::state::AppState;
pub use download::download_handler;
pub use folders::{
    list_folders_handler, validate_folder_handler, FolderBase, FoldersResponse,
    ValidateFolderRequest, ValidateFolderResponse,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use inspect::{inspect_handler, InspectRequest};
pub use matching::{match_handler, MatchRequest, MatchResponse, ReferencePairing};
pub use verify::{verify_handler, ResultRow, VerifyRequest};

use crate::error::ApiError;

/// Run filesystem and CPU-bound work off the async executor.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))?
}
