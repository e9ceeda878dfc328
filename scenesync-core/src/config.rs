//! Matching run configuration.
//!
//! All thresholds used by the extractor, the pair matcher and the classifier
//! live in one [`MatchConfig`] so a run can be validated up front, before any
//! folder is listed or image decoded.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneSyncError};

/// Default number of keypoints retained per image.
pub const DEFAULT_MAX_FEATURES: usize = 500;
/// Default fraction of cross-checked correspondences kept as "good".
pub const DEFAULT_GOOD_MATCH_PERCENT: f64 = 0.15;
/// Default minimum number of correspondences for a pair to count at all.
pub const DEFAULT_MIN_MATCHES: usize = 10;
/// Default minimum score for a candidate to be reported as a match.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.1;
/// Default score at or above which a fresh match is auto-accepted.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.7;
/// Default score below which a fresh match is considered weak.
pub const DEFAULT_LOW_THRESHOLD: f64 = 0.5;
/// Default FAST intensity threshold.
pub const DEFAULT_FAST_THRESHOLD: u8 = 20;
/// Default number of pyramid levels searched for keypoints.
pub const DEFAULT_PYRAMID_LEVELS: u8 = 4;

/// Configuration for a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum number of keypoints retained per image
    pub max_features: usize,
    /// Fraction of correspondences retained after sorting by distance, in (0, 1]
    pub good_match_percent: f64,
    /// Minimum raw correspondence count; below it the score is forced to 0
    pub min_matches: usize,
    /// Minimum score for the best candidate to be reported as the scene photo
    pub min_confidence: f64,
    /// Scores at or above this are confident
    pub high_threshold: f64,
    /// Scores below this are low-confidence candidates
    pub low_threshold: f64,
    /// FAST corner intensity threshold
    pub fast_threshold: u8,
    /// Number of image pyramid levels
    pub pyramid_levels: u8,
    /// Worker threads for the batch (None = one per core)
    pub threads: Option<usize>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            good_match_percent: DEFAULT_GOOD_MATCH_PERCENT,
            min_matches: DEFAULT_MIN_MATCHES,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            pyramid_levels: DEFAULT_PYRAMID_LEVELS,
            threads: None,
        }
    }
}

impl MatchConfig {
    /// Create a config with the two user-facing knobs set and everything else default.
    pub fn new(max_features: usize, good_match_percent: f64) -> Self {
        Self {
            max_features,
            good_match_percent,
            ..Self::default()
        }
    }

    /// Check every threshold, failing with [`SceneSyncError::Configuration`].
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(SceneSyncError::Configuration(
                "max_features must be greater than 0".into(),
            ));
        }

        if !(self.good_match_percent > 0.0 && self.good_match_percent <= 1.0) {
            return Err(SceneSyncError::Configuration(format!(
                "good_match_percent must be in (0, 1], got {}",
                self.good_match_percent
            )));
        }

        if self.min_matches == 0 {
            return Err(SceneSyncError::Configuration(
                "min_matches must be at least 1".into(),
            ));
        }

        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("high_threshold", self.high_threshold),
            ("low_threshold", self.low_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SceneSyncError::Configuration(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if self.low_threshold > self.high_threshold {
            return Err(SceneSyncError::Configuration(format!(
                "low_threshold ({}) must not exceed high_threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }

        if self.pyramid_levels == 0 {
            return Err(SceneSyncError::Configuration(
                "pyramid_levels must be at least 1".into(),
            ));
        }

        if self.threads == Some(0) {
            return Err(SceneSyncError::Configuration(
                "threads must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }
}
