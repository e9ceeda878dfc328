//! Diagnostics for a single film/scene pair.

use std::path::Path;

use serde::Serialize;

use crate::classify::{ConfidenceClassifier, ConfidenceTier};
use crate::config::MatchConfig;
use crate::error::Result;
use crate::features::OrbExtractor;
use crate::library::ImageLoader;
use crate::matcher::{PairMatcher, PairScorer};

/// Everything the matcher knows about one pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub film_photo: String,
    pub scene_photo: String,
    pub film_keypoints: usize,
    pub scene_keypoints: usize,
    pub correspondence_count: usize,
    pub good_count: usize,
    pub mean_distance: f64,
    pub confidence_score: f64,
    pub tier: ConfidenceTier,
    /// Whether this pair would be reported as a match in a run
    pub clears: bool,
}

/// Extract and score one pair of photos.
pub fn inspect_pair(
    loader: &dyn ImageLoader,
    film_path: &Path,
    scene_path: &Path,
    config: &MatchConfig,
) -> Result<PairReport> {
    config.validate()?;

    let extractor = OrbExtractor::from_config(config);
    let film = extractor.extract(&loader.load(film_path)?);
    let scene = extractor.extract(&loader.load(scene_path)?);

    let matcher = PairMatcher::from_config(config);
    let score = matcher.score(&film, &scene);
    let tier = ConfidenceClassifier::from_config(config).classify(score.confidence_score);

    Ok(PairReport {
        film_photo: display_name(film_path),
        scene_photo: display_name(scene_path),
        film_keypoints: film.len(),
        scene_keypoints: scene.len(),
        correspondence_count: score.correspondence_count,
        good_count: score.good_count,
        mean_distance: score.mean_distance,
        confidence_score: score.confidence_score,
        tier,
        clears: score.correspondence_count >= config.min_matches
            && score.confidence_score >= config.min_confidence,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
