//! Match results and their serialized row form.
//!
//! Internally a result carries a [`Decision`] that keeps freshness (computed
//! now vs. reused from the reference table) apart from confidence. The legacy
//! integer code `1 / 0 / -1` only exists on [`MatchRecord`], the row written
//! to CSV or JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneSyncError};

/// `confident_match` code of a freshly computed confident match.
pub const CODE_CONFIDENT: i8 = 1;
/// `confident_match` code of a freshly computed uncertain result.
pub const CODE_UNCERTAIN: i8 = 0;
/// `confident_match` code of a result reused from the reference table.
pub const CODE_REUSED: i8 = -1;

/// How a result's scene photo was decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Computed in this run, high confidence
    Confident { score: f64 },
    /// Computed in this run, not auto-accepted (or no candidate cleared)
    Uncertain { score: f64 },
    /// Taken from the reference table without recomputation
    Reused { prior_score: f64 },
}

impl Decision {
    pub fn score(&self) -> f64 {
        match *self {
            Self::Confident { score } | Self::Uncertain { score } => score,
            Self::Reused { prior_score } => prior_score,
        }
    }

    /// The integer code used in persisted results.
    pub fn code(&self) -> i8 {
        match self {
            Self::Confident { .. } => CODE_CONFIDENT,
            Self::Uncertain { .. } => CODE_UNCERTAIN,
            Self::Reused { .. } => CODE_REUSED,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Self::Reused { .. })
    }
}

/// The outcome for one film photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub film_photo: String,
    /// `None` when no scene photo cleared the thresholds
    pub scene_photo: Option<String>,
    pub decision: Decision,
}

impl MatchResult {
    pub fn confident(
        film_photo: impl Into<String>,
        scene_photo: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            film_photo: film_photo.into(),
            scene_photo: Some(scene_photo.into()),
            decision: Decision::Confident { score },
        }
    }

    pub fn uncertain(
        film_photo: impl Into<String>,
        scene_photo: Option<String>,
        score: f64,
    ) -> Self {
        Self {
            film_photo: film_photo.into(),
            scene_photo,
            decision: Decision::Uncertain { score },
        }
    }

    pub fn reused(
        film_photo: impl Into<String>,
        scene_photo: impl Into<String>,
        prior_score: f64,
    ) -> Self {
        Self {
            film_photo: film_photo.into(),
            scene_photo: Some(scene_photo.into()),
            decision: Decision::Reused { prior_score },
        }
    }

    /// A film photo for which nothing could be matched.
    pub fn no_match(film_photo: impl Into<String>) -> Self {
        Self::uncertain(film_photo, None, 0.0)
    }

    pub fn confidence_score(&self) -> f64 {
        self.decision.score()
    }

    pub fn is_match(&self) -> bool {
        self.scene_photo.is_some()
    }

    pub fn to_record(&self) -> MatchRecord {
        MatchRecord::from(self)
    }
}

/// One persisted result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub film_photo: String,
    pub scene_photo: Option<String>,
    pub confidence_score: f64,
    pub confident_match: i8,
}

impl From<&MatchResult> for MatchRecord {
    fn from(result: &MatchResult) -> Self {
        Self {
            film_photo: result.film_photo.clone(),
            scene_photo: result.scene_photo.clone(),
            confidence_score: result.confidence_score(),
            confident_match: result.decision.code(),
        }
    }
}

impl TryFrom<MatchRecord> for MatchResult {
    type Error = SceneSyncError;

    fn try_from(record: MatchRecord) -> Result<Self> {
        let score = record.confidence_score;
        if !(0.0..=1.0).contains(&score) {
            return Err(SceneSyncError::Store(format!(
                "confidence_score for {} must be in [0, 1], got {score}",
                record.film_photo
            )));
        }

        let scene_photo = record.scene_photo.filter(|s| !s.is_empty());
        let decision = match record.confident_match {
            CODE_CONFIDENT => Decision::Confident { score },
            CODE_UNCERTAIN => Decision::Uncertain { score },
            CODE_REUSED => Decision::Reused { prior_score: score },
            other => {
                return Err(SceneSyncError::Store(format!(
                    "confident_match for {} must be 1, 0 or -1, got {other}",
                    record.film_photo
                )))
            }
        };

        if scene_photo.is_none() && decision.code() != CODE_UNCERTAIN {
            return Err(SceneSyncError::Store(format!(
                "{} has no scene photo but confident_match {}",
                record.film_photo,
                decision.code()
            )));
        }

        Ok(Self {
            film_photo: record.film_photo,
            scene_photo,
            decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_codes() {
        assert_eq!(Decision::Confident { score: 0.9 }.code(), 1);
        assert_eq!(Decision::Uncertain { score: 0.3 }.code(), 0);
        assert_eq!(Decision::Reused { prior_score: 0.9 }.code(), -1);
        assert_eq!(Decision::Reused { prior_score: 0.9 }.score(), 0.9);
    }

    #[test]
    fn test_record_projection() {
        let record = MatchResult::reused("f1.jpg", "s1.jpg", 0.9).to_record();
        assert_eq!(record.confident_match, -1);
        assert_eq!(record.confidence_score, 0.9);
        assert_eq!(record.scene_photo.as_deref(), Some("s1.jpg"));

        let absent = MatchResult::no_match("f2.jpg").to_record();
        assert_eq!(absent.scene_photo, None);
        assert_eq!(absent.confident_match, 0);
    }

    #[test]
    fn test_record_back_to_result() {
        let original = MatchResult::confident("f1.jpg", "s1.jpg", 0.82);
        let restored = MatchResult::try_from(original.to_record()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_rejects_bad_code() {
        let record = MatchRecord {
            film_photo: "f1.jpg".into(),
            scene_photo: Some("s1.jpg".into()),
            confidence_score: 0.5,
            confident_match: 2,
        };
        assert!(matches!(
            MatchResult::try_from(record),
            Err(SceneSyncError::Store(_))
        ));
    }

    #[test]
    fn test_rejects_confident_without_scene() {
        let record = MatchRecord {
            film_photo: "f1.jpg".into(),
            scene_photo: None,
            confidence_score: 0.9,
            confident_match: 1,
        };
        assert!(MatchResult::try_from(record).is_err());
    }
}
