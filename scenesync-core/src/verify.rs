//! Verification of match results against hand-labeled ground truth.
//!
//! Every truth entry is exactly one of correct, incorrect or missed. Every
//! result without a truth entry is extra. Results with no scene photo are not
//! results for this purpose: a film photo the engine could not match counts
//! as missed, not incorrect.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SceneSyncError};
use crate::result::MatchResult;

/// A film photo paired with a scene photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoPair {
    pub film_photo: String,
    pub scene_photo: String,
}

impl PhotoPair {
    pub fn new(film_photo: impl Into<String>, scene_photo: impl Into<String>) -> Self {
        Self {
            film_photo: film_photo.into(),
            scene_photo: scene_photo.into(),
        }
    }
}

/// One ground-truth pairing.
pub type TruthRecord = PhotoPair;

/// A result whose scene photo disagrees with the truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectMatch {
    pub film_photo: String,
    pub truth_scene_photo: String,
    pub result_scene_photo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationMetrics {
    pub total_results: usize,
    pub total_truth: usize,
    pub correct_matches: usize,
    pub incorrect_matches: usize,
    pub missed_matches: usize,
    pub extra_matches: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Pairings behind each count, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub correct: Vec<PhotoPair>,
    pub incorrect: Vec<IncorrectMatch>,
    pub missed: Vec<PhotoPair>,
    pub extra: Vec<PhotoPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub metrics: VerificationMetrics,
    pub details: VerificationDetails,
}

/// Verify a run's results. Results without a scene photo are ignored.
pub fn verify(results: &[MatchResult], truth: &[TruthRecord]) -> Result<VerificationReport> {
    let pairs: Vec<PhotoPair> = results
        .iter()
        .filter_map(|r| {
            r.scene_photo
                .as_ref()
                .map(|scene| PhotoPair::new(r.film_photo.clone(), scene.clone()))
        })
        .collect();
    verify_pairs(&pairs, truth)
}

/// Verify flat result pairs against truth pairs.
///
/// Fails with [`SceneSyncError::VerificationInput`] on an empty identifier or
/// when one side maps a film photo to two different scene photos. Exact
/// duplicates are counted once.
pub fn verify_pairs(results: &[PhotoPair], truth: &[TruthRecord]) -> Result<VerificationReport> {
    let results = unique_pairs(results, "results")?;
    let truth = unique_pairs(truth, "truth")?;

    let result_lookup: HashMap<&str, &str> = results
        .iter()
        .map(|p| (p.film_photo.as_str(), p.scene_photo.as_str()))
        .collect();
    let truth_lookup: HashMap<&str, &str> = truth
        .iter()
        .map(|p| (p.film_photo.as_str(), p.scene_photo.as_str()))
        .collect();

    let mut details = VerificationDetails::default();

    for pair in &truth {
        match result_lookup.get(pair.film_photo.as_str()) {
            Some(&scene) if scene == pair.scene_photo => details.correct.push((*pair).clone()),
            Some(&scene) => details.incorrect.push(IncorrectMatch {
                film_photo: pair.film_photo.clone(),
                truth_scene_photo: pair.scene_photo.clone(),
                result_scene_photo: scene.to_string(),
            }),
            None => details.missed.push((*pair).clone()),
        }
    }

    details.extra = results
        .iter()
        .filter(|p| !truth_lookup.contains_key(p.film_photo.as_str()))
        .map(|p| (*p).clone())
        .collect();

    let metrics = compute_metrics(results.len(), truth.len(), &details);
    info!(
        total_results = metrics.total_results,
        total_truth = metrics.total_truth,
        correct = metrics.correct_matches,
        accuracy = metrics.accuracy,
        f1_score = metrics.f1_score,
        "Verification complete"
    );

    Ok(VerificationReport { metrics, details })
}

fn compute_metrics(
    total_results: usize,
    total_truth: usize,
    details: &VerificationDetails,
) -> VerificationMetrics {
    let correct = details.correct.len();
    let incorrect = details.incorrect.len();
    let missed = details.missed.len();
    let extra = details.extra.len();

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let accuracy = ratio(correct, total_truth);
    let precision = ratio(correct, correct + incorrect + extra);
    let recall = ratio(correct, correct + incorrect + missed);
    let f1_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    VerificationMetrics {
        total_results,
        total_truth,
        correct_matches: correct,
        incorrect_matches: incorrect,
        missed_matches: missed,
        extra_matches: extra,
        accuracy,
        precision,
        recall,
        f1_score,
    }
}

/// First occurrence of each film photo, in input order.
fn unique_pairs<'a>(pairs: &'a [PhotoPair], side: &str) -> Result<Vec<&'a PhotoPair>> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let mut unique = Vec::with_capacity(pairs.len());

    for pair in pairs {
        if pair.film_photo.is_empty() || pair.scene_photo.is_empty() {
            return Err(SceneSyncError::VerificationInput(format!(
                "{side} contains an empty identifier: {:?} -> {:?}",
                pair.film_photo, pair.scene_photo
            )));
        }
        match seen.get(pair.film_photo.as_str()) {
            Some(&scene) if scene == pair.scene_photo => {}
            Some(&scene) => {
                return Err(SceneSyncError::VerificationInput(format!(
                    "{side} maps {} to both {scene} and {}",
                    pair.film_photo, pair.scene_photo
                )))
            }
            None => {
                seen.insert(&pair.film_photo, &pair.scene_photo);
                unique.push(pair);
            }
        }
    }

    Ok(unique)
}
