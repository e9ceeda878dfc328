//! Confidence classification policy.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;

/// Display tier of a freshly computed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    /// At or above the high threshold; auto-accepted
    High,
    /// Between the thresholds; recorded as uncertain
    Medium,
    /// Below the low threshold; recorded as uncertain, weakest candidates
    Low,
}

impl ConfidenceTier {
    /// Whether a match in this tier is accepted without review.
    pub fn is_confident(self) -> bool {
        matches!(self, Self::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a score to a [`ConfidenceTier`] using two cut points.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceClassifier {
    high_threshold: f64,
    low_threshold: f64,
}

impl ConfidenceClassifier {
    pub fn new(high_threshold: f64, low_threshold: f64) -> Self {
        Self {
            high_threshold,
            low_threshold,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.high_threshold, config.low_threshold)
    }

    pub fn classify(&self, confidence_score: f64) -> ConfidenceTier {
        if confidence_score >= self.high_threshold {
            ConfidenceTier::High
        } else if confidence_score < self.low_threshold {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::Medium
        }
    }
}

impl Default for ConfidenceClassifier {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_points() {
        let classifier = ConfidenceClassifier::default();
        assert_eq!(classifier.classify(1.0), ConfidenceTier::High);
        assert_eq!(classifier.classify(0.7), ConfidenceTier::High);
        assert_eq!(classifier.classify(0.69), ConfidenceTier::Medium);
        assert_eq!(classifier.classify(0.5), ConfidenceTier::Medium);
        assert_eq!(classifier.classify(0.49), ConfidenceTier::Low);
        assert_eq!(classifier.classify(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn test_only_high_is_confident() {
        assert!(ConfidenceTier::High.is_confident());
        assert!(!ConfidenceTier::Medium.is_confident());
        assert!(!ConfidenceTier::Low.is_confident());
    }

    #[test]
    fn test_equal_thresholds_have_no_medium_band() {
        let classifier = ConfidenceClassifier::new(0.6, 0.6);
        assert_eq!(classifier.classify(0.6), ConfidenceTier::High);
        assert_eq!(classifier.classify(0.599), ConfidenceTier::Low);
    }
}
