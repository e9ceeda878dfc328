//! BRIEF sampling pattern.

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of binary tests, one per descriptor bit.
pub(crate) const PATTERN_LEN: usize = 256;

/// Test points lie in `[-PATTERN_RADIUS, PATTERN_RADIUS]` on both axes.
pub(crate) const PATTERN_RADIUS: i32 = 13;

const PATTERN_SEED: u64 = 0x9E37_79B9;

/// One binary test: compare the intensity at `(x1, y1)` with `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PointPair {
    pub x1: i8,
    pub y1: i8,
    pub x2: i8,
    pub y2: i8,
}

/// The fixed pattern shared by every extractor.
///
/// Drawn from ChaCha8 with a constant seed, so descriptors stay comparable
/// across runs and builds.
pub(crate) fn brief_pattern() -> &'static [PointPair] {
    static PATTERN: OnceLock<Vec<PointPair>> = OnceLock::new();
    PATTERN.get_or_init(|| generate(PATTERN_SEED))
}

fn generate(seed: u64) -> Vec<PointPair> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let r = PATTERN_RADIUS as i8;
    let mut point = move || (rng.gen_range(-r..=r), rng.gen_range(-r..=r));

    (0..PATTERN_LEN)
        .map(|_| {
            let (x1, y1) = point();
            let (mut x2, mut y2) = point();
            while (x1, y1) == (x2, y2) {
                (x2, y2) = point();
            }
            PointPair { x1, y1, x2, y2 }
        })
        .collect()
}
