//! Pair matching: descriptor correspondences reduced to one confidence score.
//!
//! Correspondences are mutual nearest neighbours under Hamming distance. Only
//! the best `good_match_percent` of them are kept; the score combines how many
//! were kept, relative to the smaller image, with how close they are.

use serde::Serialize;
use tracing::debug;

use crate::config::MatchConfig;
use crate::features::{hamming_distance, DescriptorSet};

/// Mean retained Hamming distance at which match quality reaches zero.
pub const MAX_QUALITY_DISTANCE: f64 = 100.0;

/// One cross-checked descriptor pairing between two sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Correspondence {
    pub index_a: usize,
    pub index_b: usize,
    pub distance: u32,
}

/// Outcome of comparing two descriptor sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    /// Confidence in [0, 1]
    pub confidence_score: f64,
    /// Cross-checked correspondences before filtering
    pub correspondence_count: usize,
    /// Correspondences retained after the good-match cut
    pub good_count: usize,
    /// Mean Hamming distance of the retained correspondences (0 when none)
    pub mean_distance: f64,
}

impl PairScore {
    /// Score of a pair that produced no correspondences.
    pub fn zero() -> Self {
        Self {
            confidence_score: 0.0,
            correspondence_count: 0,
            good_count: 0,
            mean_distance: 0.0,
        }
    }
}

/// Anything that can score a descriptor pair.
///
/// The reconciler only depends on this, so tests can substitute a scorer
/// that counts its calls.
pub trait PairScorer: Send + Sync {
    fn score(&self, a: &DescriptorSet, b: &DescriptorSet) -> PairScore;

    /// Minimum correspondence count for a candidate to be reported.
    fn min_matches(&self) -> usize;
}

/// Brute-force Hamming matcher with cross-check.
#[derive(Debug, Clone)]
pub struct PairMatcher {
    good_match_percent: f64,
    min_matches: usize,
}

impl PairMatcher {
    pub fn new(good_match_percent: f64, min_matches: usize) -> Self {
        Self {
            good_match_percent,
            min_matches,
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.good_match_percent, config.min_matches)
    }
}

impl PairScorer for PairMatcher {
    fn score(&self, a: &DescriptorSet, b: &DescriptorSet) -> PairScore {
        let mut matches = cross_check(a, b);
        let count = matches.len();
        if count == 0 {
            return PairScore::zero();
        }

        matches.sort_by_key(|m| (m.distance, m.index_a));
        let keep = ((count as f64 * self.good_match_percent).floor() as usize).clamp(1, count);
        let retained = &matches[..keep];

        let mean_distance =
            retained.iter().map(|m| m.distance as f64).sum::<f64>() / retained.len() as f64;
        let smaller = a.len().min(b.len()) as f64;
        let coverage = (keep as f64 / (self.good_match_percent * smaller)).min(1.0);
        let quality = (1.0 - mean_distance / MAX_QUALITY_DISTANCE).max(0.0);

        let confidence_score = if count < self.min_matches {
            0.0
        } else {
            (coverage * quality).clamp(0.0, 1.0)
        };

        debug!(
            correspondences = count,
            retained = keep,
            mean_distance,
            confidence_score,
            "Scored descriptor pair"
        );

        PairScore {
            confidence_score,
            correspondence_count: count,
            good_count: keep,
            mean_distance,
        }
    }

    fn min_matches(&self) -> usize {
        self.min_matches
    }
}

/// Mutual nearest neighbours between `a` and `b`, in `a` order.
///
/// Ties in distance resolve to the lowest index on either side.
pub fn cross_check(a: &DescriptorSet, b: &DescriptorSet) -> Vec<Correspondence> {
    let (da, db) = (a.descriptors(), b.descriptors());
    if da.is_empty() || db.is_empty() {
        return Vec::new();
    }

    let mut best_for_a = vec![(u32::MAX, 0usize); da.len()];
    let mut best_for_b = vec![(u32::MAX, 0usize); db.len()];

    for (i, desc_a) in da.iter().enumerate() {
        for (j, desc_b) in db.iter().enumerate() {
            let d = hamming_distance(desc_a, desc_b);
            if d < best_for_a[i].0 {
                best_for_a[i] = (d, j);
            }
            if d < best_for_b[j].0 {
                best_for_b[j] = (d, i);
            }
        }
    }

    best_for_a
        .iter()
        .enumerate()
        .filter(|&(i, &(_, j))| best_for_b[j].1 == i)
        .map(|(i, &(distance, j))| Correspondence {
            index_a: i,
            index_b: j,
            distance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Descriptor, Keypoint, DESCRIPTOR_BYTES};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn set_from(descriptors: Vec<Descriptor>) -> DescriptorSet {
        let kp = Keypoint {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            response: 1.0,
            octave: 0,
        };
        DescriptorSet::from_features(descriptors.into_iter().map(|d| (kp, d)))
    }

    fn random_descriptors(n: usize, seed: u64) -> Vec<Descriptor> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let mut d = [0u8; DESCRIPTOR_BYTES];
                rng.fill(&mut d[..]);
                d
            })
            .collect()
    }

    #[test]
    fn test_identical_sets_score_high() {
        let descriptors = random_descriptors(200, 42);
        let a = set_from(descriptors.clone());
        let b = set_from(descriptors);
        let score = PairMatcher::new(0.15, 10).score(&a, &b);
        assert_eq!(score.correspondence_count, 200);
        assert_eq!(score.good_count, 30);
        assert_eq!(score.mean_distance, 0.0);
        assert!(score.confidence_score >= 0.7, "got {}", score.confidence_score);
    }

    #[test]
    fn test_unrelated_sets_score_low() {
        let a = set_from(random_descriptors(200, 1));
        let b = set_from(random_descriptors(200, 2));
        let score = PairMatcher::new(0.15, 10).score(&a, &b);
        assert!(score.confidence_score < 0.1, "got {}", score.confidence_score);
    }

    #[test]
    fn test_score_always_in_unit_interval() {
        for seed in 0..20u64 {
            for p in [0.01, 0.15, 0.5, 1.0] {
                let a = set_from(random_descriptors(5 + seed as usize * 7, seed));
                let mut mixed = random_descriptors(40, seed + 100);
                mixed.extend(a.descriptors().iter().take(seed as usize).copied());
                let b = set_from(mixed);
                let s = PairMatcher::new(p, 1).score(&a, &b).confidence_score;
                assert!((0.0..=1.0).contains(&s), "seed {seed} p {p}: {s}");
            }
        }
    }

    #[test]
    fn test_empty_set_scores_zero() {
        let a = set_from(random_descriptors(50, 9));
        let score = PairMatcher::new(0.15, 10).score(&a, &DescriptorSet::empty());
        assert_eq!(score, PairScore::zero());
    }

    #[test]
    fn test_below_min_matches_forces_zero_but_reports_count() {
        let descriptors = random_descriptors(5, 3);
        let a = set_from(descriptors.clone());
        let b = set_from(descriptors);
        let score = PairMatcher::new(0.15, 10).score(&a, &b);
        assert_eq!(score.correspondence_count, 5);
        assert_eq!(score.confidence_score, 0.0);
    }

    #[test]
    fn test_retains_at_least_one() {
        let descriptors = random_descriptors(3, 5);
        let a = set_from(descriptors.clone());
        let b = set_from(descriptors);
        let score = PairMatcher::new(0.15, 1).score(&a, &b);
        assert_eq!(score.good_count, 1);
        assert!(score.confidence_score > 0.0);
    }

    #[test]
    fn test_cross_check_is_mutual() {
        let a = set_from(vec![[0x00; 32], [0xFF; 32]]);
        let b = set_from(vec![[0x01; 32], [0x03; 32], [0xFE; 32]]);
        let matches = cross_check(&a, &b);
        assert_eq!(
            matches,
            vec![
                Correspondence {
                    index_a: 0,
                    index_b: 0,
                    distance: 32
                },
                Correspondence {
                    index_a: 1,
                    index_b: 2,
                    distance: 32
                },
            ]
        );
    }
}
