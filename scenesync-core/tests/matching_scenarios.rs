//! End-to-end matching and verification scenarios.
//!
//! Folders and images live in memory so tests can count every image load.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scenesync_core::{
    verify, BatchOrchestrator, Decision, ExtractionError, FolderLister, ImageLoader, MatchConfig,
    MatchResult, PhotoPair, ReferenceTable, SceneSyncError,
};

// ============================================================================
// In-memory collaborators
// ============================================================================

#[derive(Default)]
struct MemoryLibrary {
    folders: HashMap<PathBuf, Vec<(String, GrayImage)>>,
    loads: Mutex<Vec<PathBuf>>,
}

impl MemoryLibrary {
    fn with_folder(mut self, folder: &str, photos: Vec<(&str, GrayImage)>) -> Self {
        self.folders.insert(
            PathBuf::from(folder),
            photos
                .into_iter()
                .map(|(name, img)| (name.to_string(), img))
                .collect(),
        );
        self
    }

    fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    fn loads_of(&self, path: &str) -> usize {
        self.loads
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == Path::new(path))
            .count()
    }
}

impl FolderLister for MemoryLibrary {
    fn list(&self, folder: &Path) -> scenesync_core::Result<Vec<String>> {
        let photos = self
            .folders
            .get(folder)
            .ok_or_else(|| SceneSyncError::FolderUnreadable {
                path: folder.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such folder"),
            })?;
        let mut names: Vec<String> = photos.iter().map(|(n, _)| n.clone()).collect();
        names.sort();
        Ok(names)
    }
}

impl ImageLoader for MemoryLibrary {
    fn load(&self, path: &Path) -> Result<GrayImage, ExtractionError> {
        self.loads.lock().unwrap().push(path.to_path_buf());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        path.parent()
            .and_then(|folder| self.folders.get(folder))
            .and_then(|photos| photos.iter().find(|(n, _)| *n == name))
            .map(|(_, img)| img.clone())
            .ok_or_else(|| ExtractionError::image_read(name, "not found"))
    }
}

// ============================================================================
// Test images
// ============================================================================

fn textured(seed: u64) -> GrayImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let blocks: Vec<i32> = (0..32 * 32).map(|_| rng.gen_range(28..228)).collect();
    GrayImage::from_fn(256, 256, |x, y| {
        let block = blocks[((y / 8) * 32 + x / 8) as usize];
        let noise = rng.gen_range(-5..=5);
        Luma([(block + noise).clamp(0, 255) as u8])
    })
}

fn flat() -> GrayImage {
    GrayImage::from_pixel(256, 256, Luma([128]))
}

/// `image` moved right by `dx` and down by `dy`, wrapping at the edges.
fn shifted(image: &GrayImage, dx: u32, dy: u32) -> GrayImage {
    let (w, h) = image.dimensions();
    GrayImage::from_fn(w, h, |x, y| *image.get_pixel((x + w - dx) % w, (y + h - dy) % h))
}

/// `image` after a lossy JPEG round trip.
fn recompressed(image: &GrayImage, quality: u8) -> GrayImage {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .unwrap();
    image::load_from_memory(&bytes).unwrap().to_luma8()
}

fn two_by_two() -> MemoryLibrary {
    MemoryLibrary::default()
        .with_folder("film", vec![("f1.png", textured(1)), ("f2.png", flat())])
        .with_folder("scene", vec![("s1.png", textured(1)), ("s2.png", textured(2))])
}

fn run(library: &MemoryLibrary, reference: &ReferenceTable) -> scenesync_core::MatchRun {
    BatchOrchestrator::new(library, library)
        .run(
            Path::new("film"),
            Path::new("scene"),
            &MatchConfig::new(500, 0.15),
            reference,
        )
        .unwrap()
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_true_pair_confident_and_blank_photo_unmatched() {
    let library = two_by_two();
    let run = run(&library, &ReferenceTable::new());

    assert_eq!(run.results.len(), 2);

    let f1 = &run.results[0];
    assert_eq!(f1.film_photo, "f1.png");
    assert_eq!(f1.scene_photo.as_deref(), Some("s1.png"));
    assert!(f1.confidence_score() >= 0.7, "score {}", f1.confidence_score());
    assert_eq!(f1.decision.code(), 1);

    let f2 = &run.results[1];
    assert_eq!(f2.film_photo, "f2.png");
    assert_eq!(f2.scene_photo, None);
    assert!(f2.confidence_score() < 0.01);
    assert_eq!(f2.decision.code(), 0);

    assert_eq!(run.summary.total_matches, 1);
    assert_eq!(run.summary.new_matches, 1);
    assert_eq!(run.summary.existing_matches, 0);
    assert_eq!(run.summary.unmatched, 1);
}

#[test]
fn test_shifted_and_recompressed_photos_match_confidently() {
    let (day, night) = (textured(5), textured(6));
    let library = MemoryLibrary::default()
        .with_folder("film", vec![("f1.png", day.clone()), ("f2.png", night.clone())])
        .with_folder(
            "scene",
            vec![
                ("s1.png", shifted(&day, 3, 2)),
                ("s2.jpg", recompressed(&night, 95)),
                ("s3.png", textured(7)),
            ],
        );

    let run = run(&library, &ReferenceTable::new());

    let expected = [("f1.png", "s1.png"), ("f2.png", "s2.jpg")];
    for (result, (film, scene)) in run.results.iter().zip(expected) {
        assert_eq!(result.film_photo, film);
        assert_eq!(result.scene_photo.as_deref(), Some(scene));
        assert!(
            result.confidence_score() >= 0.7,
            "{film} scored {}",
            result.confidence_score()
        );
        assert_eq!(result.decision.code(), 1);
    }
    assert_eq!(run.summary.new_matches, 2);
}

#[test]
fn test_reference_hit_needs_no_extraction() {
    let library =
        MemoryLibrary::default()
            .with_folder("film", vec![("f1.png", textured(1))])
            .with_folder("scene", vec![("s1.png", textured(1)), ("s2.png", textured(2))]);
    let mut reference = ReferenceTable::new();
    reference.insert("f1.png", "s1.png", 0.9).unwrap();

    let run = run(&library, &reference);

    assert_eq!(run.results, vec![MatchResult::reused("f1.png", "s1.png", 0.9)]);
    assert_eq!(run.results[0].decision, Decision::Reused { prior_score: 0.9 });
    assert_eq!(run.records()[0].confident_match, -1);
    assert_eq!(library.load_count(), 0);
    assert_eq!(run.summary.existing_matches, 1);
}

#[test]
fn test_reused_and_fresh_results_mix() {
    let library = two_by_two();
    let mut reference = ReferenceTable::new();
    reference.insert("f2.png", "s2.png", 0.8).unwrap();

    let run = run(&library, &reference);

    assert_eq!(run.results[0].decision.code(), 1);
    assert_eq!(run.results[1], MatchResult::reused("f2.png", "s2.png", 0.8));
    assert_eq!(library.loads_of("film/f2.png"), 0);
    assert_eq!(run.summary.total_matches, 2);
}

#[test]
fn test_each_scene_photo_loaded_once() {
    let library = MemoryLibrary::default()
        .with_folder(
            "film",
            vec![
                ("f1.png", textured(1)),
                ("f2.png", textured(2)),
                ("f3.png", textured(3)),
                ("f4.png", textured(4)),
            ],
        )
        .with_folder("scene", vec![("s1.png", textured(3)), ("s2.png", textured(1))]);

    let run = run(&library, &ReferenceTable::new());

    assert_eq!(library.loads_of("scene/s1.png"), 1);
    assert_eq!(library.loads_of("scene/s2.png"), 1);
    assert_eq!(library.load_count(), 6);
    assert_eq!(run.results[0].scene_photo.as_deref(), Some("s2.png"));
    assert_eq!(run.results[2].scene_photo.as_deref(), Some("s1.png"));
}

#[test]
fn test_runs_are_repeatable() {
    let library = two_by_two();
    let first = run(&library, &ReferenceTable::new());
    let second = run(&library, &ReferenceTable::new());
    assert_eq!(first.results, second.results);
}

#[test]
fn test_single_thread_matches_parallel() {
    let library = two_by_two();
    let parallel = run(&library, &ReferenceTable::new());
    let serial = BatchOrchestrator::new(&library, &library)
        .run(
            Path::new("film"),
            Path::new("scene"),
            &MatchConfig {
                threads: Some(1),
                ..MatchConfig::default()
            },
            &ReferenceTable::new(),
        )
        .unwrap();
    assert_eq!(parallel.results, serial.results);
}

#[test]
fn test_empty_scene_folder_leaves_everything_unmatched() {
    let library = MemoryLibrary::default()
        .with_folder("film", vec![("f1.png", textured(1))])
        .with_folder("scene", vec![]);

    let run = run(&library, &ReferenceTable::new());
    assert_eq!(run.results, vec![MatchResult::no_match("f1.png")]);
}

#[test]
fn test_unlistable_folder_fails_run() {
    let library = MemoryLibrary::default().with_folder("film", vec![("f1.png", textured(1))]);
    let err = BatchOrchestrator::new(&library, &library)
        .run(
            Path::new("film"),
            Path::new("scene"),
            &MatchConfig::default(),
            &ReferenceTable::new(),
        )
        .unwrap_err();
    assert!(matches!(err, SceneSyncError::FolderUnreadable { .. }));
}

// ============================================================================
// Verification
// ============================================================================

#[test]
fn test_verify_run_output() {
    let library = two_by_two();
    let run = run(&library, &ReferenceTable::new());
    let truth = vec![
        PhotoPair::new("f1.png", "s1.png"),
        PhotoPair::new("f2.png", "s2.png"),
    ];

    let report = verify(&run.results, &truth).unwrap();
    let m = &report.metrics;
    assert_eq!(m.correct_matches, 1);
    assert_eq!(m.missed_matches, 1);
    assert_eq!(m.incorrect_matches, 0);
    assert_eq!(m.extra_matches, 0);
    assert_eq!(m.accuracy, 0.5);
    assert_eq!(m.precision, 1.0);
    assert_eq!(m.recall, 0.5);
    assert!((m.f1_score - 0.667).abs() < 1e-3);
}

#[test]
fn test_verify_wrong_pairing() {
    let results = vec![MatchResult::confident("f1", "s9", 0.9)];
    let truth = vec![PhotoPair::new("f1", "s1")];

    let m = verify(&results, &truth).unwrap().metrics;
    assert_eq!(
        (m.correct_matches, m.incorrect_matches, m.missed_matches, m.extra_matches),
        (0, 1, 0, 0)
    );
    assert_eq!(m.f1_score, 0.0);
}
