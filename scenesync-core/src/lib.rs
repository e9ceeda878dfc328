//! Scene Sync Core - film to scene photo matching and verification
//!
//! This crate locates each "film" photo among a folder of "scene" photos and
//! checks the produced pairings against hand-labeled ground truth.
//!
//! # Features
//!
//! - ORB-style keypoints and 256-bit binary descriptors
//! - Cross-checked Hamming matching reduced to a confidence score in [0, 1]
//! - Reuse of previously confirmed pairings from a reference table
//! - Parallel folder runs with a shared, compute-once scene descriptor cache
//! - Confusion accounting with accuracy, precision, recall and F1
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use scenesync_core::{store, BatchOrchestrator, FsLibrary, MatchConfig, ReferenceTable};
//!
//! # fn example() -> scenesync_core::Result<()> {
//! let config = MatchConfig::new(500, 0.15);
//! let run = BatchOrchestrator::new(&FsLibrary, &FsLibrary).run(
//!     Path::new("film-photos/day1"),
//!     Path::new("scene-info/day1"),
//!     &config,
//!     &ReferenceTable::new(),
//! )?;
//! store::write_results(Path::new("output/results.csv"), &run.results)?;
//!
//! let truth = store::read_truth(Path::new("truth.csv"))?;
//! let report = scenesync_core::verify(&run.results, &truth)?;
//! println!("F1: {:.3}", report.metrics.f1_score);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod features;
pub mod inspect;
pub mod library;
pub mod matcher;
pub mod reconcile;
pub mod reference;
pub mod result;
pub mod store;
pub mod verify;

pub use batch::{BatchOrchestrator, MatchRun, RunSummary};
pub use classify::{ConfidenceClassifier, ConfidenceTier};
pub use config::MatchConfig;
pub use error::{ExtractionError, Result, SceneSyncError};
pub use features::{DescriptorSet, Keypoint, OrbExtractor};
pub use inspect::{inspect_pair, PairReport};
pub use library::{
    available_folders, setup_directories, validate_folder, FolderLister, FolderSummary, FsLibrary,
    ImageLoader,
};
pub use matcher::{PairMatcher, PairScore, PairScorer};
pub use reconcile::{DescriptorProvider, Reconciler};
pub use reference::{ReferenceEntry, ReferenceTable};
pub use result::{Decision, MatchRecord, MatchResult};
pub use verify::{
    verify, verify_pairs, PhotoPair, TruthRecord, VerificationMetrics, VerificationReport,
};

#[cfg(test)]
pub(crate) mod test_utils {
    use image::{GrayImage, Luma};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    pub fn flat_image(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    /// 8px blocks of pseudo-random intensity with light per-pixel noise.
    pub fn textured_image(width: u32, height: u32, seed: u64) -> GrayImage {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (bw, bh) = (width.div_ceil(8), height.div_ceil(8));
        let blocks: Vec<i32> = (0..bw * bh).map(|_| rng.gen_range(28..228)).collect();
        GrayImage::from_fn(width, height, |x, y| {
            let block = blocks[((y / 8) * bw + x / 8) as usize];
            let noise = rng.gen_range(-5..=5);
            Luma([(block + noise).clamp(0, 255) as u8])
        })
    }

    /// `image` moved by `(dx, dy)` with wrap-around.
    pub fn shifted(image: &GrayImage, dx: u32, dy: u32) -> GrayImage {
        let (w, h) = image.dimensions();
        GrayImage::from_fn(w, h, |x, y| *image.get_pixel((x + dx) % w, (y + dy) % h))
    }
}
