//! Verification handler
//!
//! Handles POST /api/verify: scores submitted result rows against truth rows.

use axum::Json;
use scenesync_core::{verify_pairs, PhotoPair, TruthRecord, VerificationReport};
use serde::Deserialize;

use crate::error::ApiError;

/// A result row as written by a match run; `scene_photo` may be null or empty.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultRow {
    pub film_photo: String,
    #[serde(default)]
    pub scene_photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub results: Vec<ResultRow>,
    pub truth: Vec<TruthRecord>,
}

/// POST /api/verify - Compare results with ground truth
///
/// Result rows without a scene photo are unmatched and do not count as
/// results. Any extra fields on the rows (scores, codes) are ignored. Photo
/// names on both sides are trimmed before comparison.
pub async fn verify_handler(
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerificationReport>, ApiError> {
    let results: Vec<PhotoPair> = request
        .results
        .into_iter()
        .filter_map(|row| {
            let scene = row.scene_photo.unwrap_or_default();
            let scene = scene.trim();
            (!scene.is_empty()).then(|| PhotoPair::new(row.film_photo.trim(), scene))
        })
        .collect();

    let truth: Vec<TruthRecord> = request
        .truth
        .iter()
        .map(|row| PhotoPair::new(row.film_photo.trim(), row.scene_photo.trim()))
        .collect();

    let report = verify_pairs(&results, &truth)?;

    tracing::info!(
        correct = report.metrics.correct_matches,
        incorrect = report.metrics.incorrect_matches,
        missed = report.metrics.missed_matches,
        extra = report.metrics.extra_matches,
        "Verification completed"
    );

    Ok(Json(report))
}
