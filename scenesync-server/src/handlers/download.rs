//! Result file download handler

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::resolve_name;

/// GET /api/download/{filename} - Fetch a result file from the output directory
pub async fn download_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = resolve_name(&state.output_dir, &filename, "filename")?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("Result file {}", filename.trim())));
        }
        Err(e) => return Err(ApiError::internal(format!("Failed to read result file: {}", e))),
    };

    let content_type = if filename.trim().to_ascii_lowercase().ends_with(".json") {
        "application/json"
    } else {
        "text/csv"
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename.trim()),
            ),
        ],
        bytes,
    ))
}
