//! Folder listing and validation handlers

use std::path::PathBuf;

use axum::{extract::State, Json};
use scenesync_core::library::SUPPORTED_EXTENSIONS;
use scenesync_core::{available_folders, validate_folder};
use serde::{Deserialize, Serialize};

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::resolve_name;

/// Photo names returned by folder validation.
const SAMPLE_SIZE: usize = 20;

/// Response for GET /api/folders
#[derive(Debug, Serialize)]
pub struct FoldersResponse {
    pub film_folders: Vec<String>,
    pub scene_folders: Vec<String>,
}

/// GET /api/folders - Sub-folders of both bases that contain photos
pub async fn list_folders_handler(
    State(state): State<AppState>,
) -> Result<Json<FoldersResponse>, ApiError> {
    let response = run_blocking(move || {
        Ok(FoldersResponse {
            film_folders: available_folders(&state.film_base)?,
            scene_folders: available_folders(&state.scene_base)?,
        })
    })
    .await?;

    Ok(Json(response))
}

/// Which base directory a folder name is resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderBase {
    Film,
    Scene,
}

#[derive(Debug, Deserialize)]
pub struct ValidateFolderRequest {
    pub base: FolderBase,
    pub folder: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateFolderResponse {
    pub base: FolderBase,
    pub folder: String,
    pub image_count: usize,
    pub formats_found: Vec<String>,
    pub supported_formats: &'static [&'static str],
    pub sample: Vec<String>,
}

/// POST /api/validate-folder - Summarise the photos in one folder
pub async fn validate_folder_handler(
    State(state): State<AppState>,
    Json(request): Json<ValidateFolderRequest>,
) -> Result<Json<ValidateFolderResponse>, ApiError> {
    let base = match request.base {
        FolderBase::Film => &state.film_base,
        FolderBase::Scene => &state.scene_base,
    };
    let path: PathBuf = resolve_name(base, &request.folder, "folder")?;

    let summary = run_blocking(move || Ok(validate_folder(&path, SAMPLE_SIZE)?)).await?;

    Ok(Json(ValidateFolderResponse {
        base: request.base,
        folder: request.folder.trim().to_string(),
        image_count: summary.image_count,
        formats_found: summary.formats_found,
        supported_formats: SUPPORTED_EXTENSIONS,
        sample: summary.sample,
    }))
}
