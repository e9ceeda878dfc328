//! Single pair inspection handler

use axum::{extract::State, Json};
use scenesync_core::{inspect_pair, FsLibrary, MatchConfig, PairReport};
use serde::Deserialize;

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::resolve_name;

#[derive(Debug, Deserialize)]
pub struct InspectRequest {
    pub film_folder: String,
    pub film_photo: String,
    pub scene_folder: String,
    pub scene_photo: String,
    #[serde(flatten)]
    pub config: MatchConfig,
}

/// POST /api/inspect - Score one film photo against one scene photo
pub async fn inspect_handler(
    State(state): State<AppState>,
    Json(request): Json<InspectRequest>,
) -> Result<Json<PairReport>, ApiError> {
    let film_dir = resolve_name(&state.film_base, &request.film_folder, "film_folder")?;
    let scene_dir = resolve_name(&state.scene_base, &request.scene_folder, "scene_folder")?;
    let film = resolve_name(&film_dir, &request.film_photo, "film_photo")?;
    let scene = resolve_name(&scene_dir, &request.scene_photo, "scene_photo")?;
    let config = request.config;

    let report = run_blocking(move || Ok(inspect_pair(&FsLibrary, &film, &scene, &config)?)).await?;
    Ok(Json(report))
}
