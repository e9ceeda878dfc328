//! Per-film-photo decision: reuse a confirmed pairing or search the candidates.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::classify::ConfidenceClassifier;
use crate::config::MatchConfig;
use crate::error::ExtractionError;
use crate::features::DescriptorSet;
use crate::matcher::{PairScore, PairScorer};
use crate::reference::ReferenceTable;
use crate::result::MatchResult;

/// Source of descriptors for scene photos, by identifier.
pub trait DescriptorProvider: Send + Sync {
    fn descriptors(&self, photo: &str) -> Result<Arc<DescriptorSet>, ExtractionError>;
}

/// Resolves one film photo against a set of candidate scene photos.
pub struct Reconciler<'a> {
    scorer: &'a dyn PairScorer,
    classifier: ConfidenceClassifier,
    min_confidence: f64,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        scorer: &'a dyn PairScorer,
        classifier: ConfidenceClassifier,
        min_confidence: f64,
    ) -> Self {
        Self {
            scorer,
            classifier,
            min_confidence,
        }
    }

    pub fn from_config(scorer: &'a dyn PairScorer, config: &MatchConfig) -> Self {
        Self::new(
            scorer,
            ConfidenceClassifier::from_config(config),
            config.min_confidence,
        )
    }

    /// Decide the scene photo for `film_photo`.
    ///
    /// A reference-table hit is returned as reused without calling
    /// `film_descriptors` or touching `scenes`. Otherwise every candidate is
    /// scored in order and the highest score wins, the earliest candidate on
    /// ties. Candidates that fail to load are skipped. A film photo that fails
    /// to load yields a no-match result.
    pub fn resolve<F>(
        &self,
        film_photo: &str,
        film_descriptors: F,
        candidates: &[String],
        scenes: &dyn DescriptorProvider,
        reference: &ReferenceTable,
    ) -> MatchResult
    where
        F: FnOnce() -> Result<Arc<DescriptorSet>, ExtractionError>,
    {
        if let Some(entry) = reference.get(film_photo) {
            debug!(
                film_photo,
                scene_photo = %entry.scene_photo,
                prior_score = entry.prior_score,
                "Reusing reference pairing"
            );
            return MatchResult::reused(film_photo, entry.scene_photo.clone(), entry.prior_score);
        }

        if candidates.is_empty() {
            return MatchResult::no_match(film_photo);
        }

        let film = match film_descriptors() {
            Ok(set) => set,
            Err(e) => {
                warn!(film_photo, error = %e, "Skipping unreadable film photo");
                return MatchResult::no_match(film_photo);
            }
        };
        if film.is_empty() {
            debug!(film_photo, "Film photo has no keypoints");
            return MatchResult::no_match(film_photo);
        }

        let mut best_clearing: Option<(&str, PairScore)> = None;
        let mut best_failing = 0.0f64;

        for candidate in candidates {
            let scene = match scenes.descriptors(candidate) {
                Ok(set) => set,
                Err(e) => {
                    debug!(
                        film_photo,
                        scene_photo = %candidate,
                        error = %e,
                        "Skipping unreadable candidate"
                    );
                    continue;
                }
            };

            let score = self.scorer.score(&film, &scene);
            if self.clears(&score) {
                let better = best_clearing
                    .map_or(true, |(_, best)| score.confidence_score > best.confidence_score);
                if better {
                    best_clearing = Some((candidate.as_str(), score));
                }
            } else if score.confidence_score > best_failing {
                best_failing = score.confidence_score;
            }
        }

        match best_clearing {
            Some((scene_photo, score)) => {
                let tier = self.classifier.classify(score.confidence_score);
                debug!(
                    film_photo,
                    scene_photo,
                    confidence_score = score.confidence_score,
                    %tier,
                    "Selected best candidate"
                );
                if tier.is_confident() {
                    MatchResult::confident(film_photo, scene_photo, score.confidence_score)
                } else {
                    MatchResult::uncertain(
                        film_photo,
                        Some(scene_photo.to_string()),
                        score.confidence_score,
                    )
                }
            }
            None => MatchResult::uncertain(film_photo, None, best_failing),
        }
    }

    fn clears(&self, score: &PairScore) -> bool {
        score.correspondence_count >= self.scorer.min_matches()
            && score.confidence_score >= self.min_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::features::{Keypoint, DESCRIPTOR_BYTES};
    use crate::result::Decision;

    /// Scores by looking up the first descriptor byte of each side.
    struct TableScorer {
        scores: HashMap<(u8, u8), (f64, usize)>,
        calls: AtomicUsize,
    }

    impl TableScorer {
        fn new(entries: &[((u8, u8), (f64, usize))]) -> Self {
            Self {
                scores: entries.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PairScorer for TableScorer {
        fn score(&self, a: &DescriptorSet, b: &DescriptorSet) -> PairScore {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = (a.descriptors()[0][0], b.descriptors()[0][0]);
            let (confidence_score, correspondence_count) =
                self.scores.get(&key).copied().unwrap_or((0.0, 0));
            PairScore {
                confidence_score,
                correspondence_count,
                good_count: correspondence_count,
                mean_distance: 0.0,
            }
        }

        fn min_matches(&self) -> usize {
            10
        }
    }

    struct Scenes(HashMap<String, u8>);

    impl DescriptorProvider for Scenes {
        fn descriptors(&self, photo: &str) -> Result<Arc<DescriptorSet>, ExtractionError> {
            self.0
                .get(photo)
                .map(|&tag| tagged(tag))
                .ok_or_else(|| ExtractionError::image_read(photo, "missing"))
        }
    }

    fn tagged(tag: u8) -> Arc<DescriptorSet> {
        let kp = Keypoint {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            response: 1.0,
            octave: 0,
        };
        Arc::new(DescriptorSet::from_features([(kp, [tag; DESCRIPTOR_BYTES])]))
    }

    fn scenes(entries: &[(&str, u8)]) -> Scenes {
        Scenes(entries.iter().map(|&(k, v)| (k.to_string(), v)).collect())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reference_hit_skips_matching() {
        let scorer = TableScorer::new(&[]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let mut reference = ReferenceTable::new();
        reference.insert("f1", "s1", 0.9).unwrap();

        let mut film_calls = 0;
        let result = reconciler.resolve(
            "f1",
            || {
                film_calls += 1;
                Ok(tagged(1))
            },
            &names(&["s1", "s2"]),
            &scenes(&[("s1", 10), ("s2", 20)]),
            &reference,
        );

        assert_eq!(result, MatchResult::reused("f1", "s1", 0.9));
        assert_eq!(film_calls, 0);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_picks_highest_score() {
        let scorer = TableScorer::new(&[((1, 10), (0.4, 20)), ((1, 20), (0.85, 40))]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let result = reconciler.resolve(
            "f1",
            || Ok(tagged(1)),
            &names(&["s1", "s2"]),
            &scenes(&[("s1", 10), ("s2", 20)]),
            &ReferenceTable::new(),
        );
        assert_eq!(result, MatchResult::confident("f1", "s2", 0.85));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let scorer = TableScorer::new(&[((1, 10), (0.6, 20)), ((1, 20), (0.6, 20))]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let result = reconciler.resolve(
            "f1",
            || Ok(tagged(1)),
            &names(&["s2", "s1"]),
            &scenes(&[("s1", 10), ("s2", 20)]),
            &ReferenceTable::new(),
        );
        assert_eq!(result.scene_photo.as_deref(), Some("s2"));
        assert_eq!(result.decision, Decision::Uncertain { score: 0.6 });
    }

    #[test]
    fn test_nothing_clears_reports_best_failing_score() {
        // s1 has too few correspondences; s2 is below min_confidence
        let scorer = TableScorer::new(&[((1, 10), (0.0, 4)), ((1, 20), (0.05, 30))]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let result = reconciler.resolve(
            "f1",
            || Ok(tagged(1)),
            &names(&["s1", "s2"]),
            &scenes(&[("s1", 10), ("s2", 20)]),
            &ReferenceTable::new(),
        );
        assert_eq!(result.scene_photo, None);
        assert_eq!(result.decision, Decision::Uncertain { score: 0.05 });
    }

    #[test]
    fn test_unreadable_film_photo_is_no_match() {
        let scorer = TableScorer::new(&[]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let result = reconciler.resolve(
            "f1",
            || Err(ExtractionError::image_read("f1", "corrupt")),
            &names(&["s1"]),
            &scenes(&[("s1", 10)]),
            &ReferenceTable::new(),
        );
        assert_eq!(result, MatchResult::no_match("f1"));
    }

    #[test]
    fn test_unreadable_candidate_is_skipped() {
        let scorer = TableScorer::new(&[((1, 20), (0.75, 50))]);
        let reconciler = Reconciler::new(&scorer, ConfidenceClassifier::default(), 0.1);
        let result = reconciler.resolve(
            "f1",
            || Ok(tagged(1)),
            &names(&["broken", "s2"]),
            &scenes(&[("s2", 20)]),
            &ReferenceTable::new(),
        );
        assert_eq!(result, MatchResult::confident("f1", "s2", 0.75));
    }
}
