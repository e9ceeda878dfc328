//! Folder matching handler
//!
//! Handles POST /api/match: matches one film folder against one scene folder,
//! writes the result file under the output directory and returns the rows.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use scenesync_core::{
    store, BatchOrchestrator, FsLibrary, MatchConfig, MatchRecord, ReferenceTable, RunSummary,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run_blocking;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::resolve_name;

/// A confirmed pairing supplied with a match request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferencePairing {
    pub film_photo: String,
    pub scene_photo: String,
    /// Defaults to 1.0
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

/// Request body for POST /api/match
///
/// Any [`MatchConfig`] field may be given at the top level; omitted fields
/// take their defaults.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub film_folder: String,
    pub scene_folder: String,
    #[serde(default)]
    pub reference: Vec<ReferencePairing>,
    #[serde(flatten)]
    pub config: MatchConfig,
}

/// Response for a completed match run
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub film_folder: String,
    pub scene_folder: String,
    pub output_file: String,
    pub summary: RunSummary,
    pub results: Vec<MatchRecord>,
}

fn reference_table(pairings: &[ReferencePairing]) -> Result<ReferenceTable, ApiError> {
    let mut table = ReferenceTable::new();
    for pairing in pairings {
        let (film, scene) = (pairing.film_photo.trim(), pairing.scene_photo.trim());
        if film.is_empty() || scene.is_empty() {
            return Err(ApiError::bad_request(
                "reference pairings need both film_photo and scene_photo",
            ));
        }
        table.insert(
            film,
            scene,
            pairing
                .confidence_score
                .unwrap_or(store::DEFAULT_REFERENCE_SCORE),
        )?;
    }
    Ok(table)
}

/// POST /api/match - Match a film folder against a scene folder
pub async fn match_handler(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let film_folder = request.film_folder.trim().to_string();
    let scene_folder = request.scene_folder.trim().to_string();
    let film_path = resolve_name(&state.film_base, &film_folder, "film_folder")?;
    let scene_path = resolve_name(&state.scene_base, &scene_folder, "scene_folder")?;

    request.config.validate()?;
    let reference = reference_table(&request.reference)?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let output_path = state
        .output_dir
        .join(format!("match_results_{}_{}.csv", film_folder, scene_folder));

    tracing::info!(
        run_id = %run_id,
        film_folder = %film_folder,
        scene_folder = %scene_folder,
        reference_entries = reference.len(),
        "Match run requested"
    );

    let config = request.config;
    let output = output_path.clone();
    let run = run_blocking(move || {
        let run = BatchOrchestrator::new(&FsLibrary, &FsLibrary).run(
            &film_path,
            &scene_path,
            &config,
            &reference,
        )?;
        store::write_results(&output, &run.results)?;
        Ok(run)
    })
    .await?;

    tracing::info!(
        run_id = %run_id,
        total_matches = run.summary.total_matches,
        output_file = %output_path.display(),
        "Match run finished"
    );

    Ok(Json(MatchResponse {
        run_id,
        started_at,
        film_folder,
        scene_folder,
        output_file: output_path.display().to_string(),
        results: run.records(),
        summary: run.summary,
    }))
}
