//! Folder-against-folder matching runs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::SceneCache;
use crate::config::MatchConfig;
use crate::error::{ExtractionError, Result, SceneSyncError};
use crate::features::{DescriptorSet, OrbExtractor};
use crate::library::{FolderLister, ImageLoader};
use crate::matcher::PairMatcher;
use crate::reconcile::{DescriptorProvider, Reconciler};
use crate::reference::ReferenceTable;
use crate::result::{Decision, MatchRecord, MatchResult};

/// Loads photos from one folder and extracts their descriptors.
pub struct FolderExtractor<'a> {
    loader: &'a dyn ImageLoader,
    folder: PathBuf,
    extractor: OrbExtractor,
}

impl<'a> FolderExtractor<'a> {
    pub fn new(
        loader: &'a dyn ImageLoader,
        folder: impl Into<PathBuf>,
        extractor: OrbExtractor,
    ) -> Self {
        Self {
            loader,
            folder: folder.into(),
            extractor,
        }
    }
}

impl DescriptorProvider for FolderExtractor<'_> {
    fn descriptors(&self, photo: &str) -> std::result::Result<Arc<DescriptorSet>, ExtractionError> {
        let image = self.loader.load(&self.folder.join(photo))?;
        Ok(Arc::new(self.extractor.extract(&image)))
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub film_photos: usize,
    pub scene_photos: usize,
    /// Results with a scene photo
    pub total_matches: usize,
    /// Results reused from the reference table
    pub existing_matches: usize,
    /// Results with a scene photo computed in this run
    pub new_matches: usize,
    /// Freshly computed results above the high threshold
    pub confident_matches: usize,
    /// Results without a scene photo
    pub unmatched: usize,
    /// Reference entries for film photos not in the film folder
    pub stale_references: Vec<String>,
    /// Photos that could not be decoded
    pub unreadable_photos: Vec<String>,
}

impl RunSummary {
    fn tally(results: &[MatchResult]) -> Self {
        let mut summary = Self {
            film_photos: results.len(),
            ..Self::default()
        };
        for result in results {
            match (result.decision, result.is_match()) {
                (Decision::Reused { .. }, _) => {
                    summary.existing_matches += 1;
                    summary.total_matches += 1;
                }
                (_, false) => summary.unmatched += 1,
                (decision, true) => {
                    summary.new_matches += 1;
                    summary.total_matches += 1;
                    if matches!(decision, Decision::Confident { .. }) {
                        summary.confident_matches += 1;
                    }
                }
            }
        }
        summary
    }
}

/// Ordered results of a run plus its totals.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRun {
    pub results: Vec<MatchResult>,
    pub summary: RunSummary,
}

impl MatchRun {
    pub fn records(&self) -> Vec<MatchRecord> {
        self.results.iter().map(MatchRecord::from).collect()
    }

    /// The `n` highest-scoring matched results, best first.
    pub fn top(&self, n: usize) -> Vec<&MatchResult> {
        let mut matched: Vec<&MatchResult> = self.results.iter().filter(|r| r.is_match()).collect();
        matched.sort_by(|a, b| b.confidence_score().total_cmp(&a.confidence_score()));
        matched.truncate(n);
        matched
    }
}

/// Drives a matching run over two folders.
pub struct BatchOrchestrator<'a> {
    lister: &'a dyn FolderLister,
    loader: &'a dyn ImageLoader,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(lister: &'a dyn FolderLister, loader: &'a dyn ImageLoader) -> Self {
        Self {
            lister,
            loader,
            cancel: None,
        }
    }

    /// Stop starting new film photos once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Match every photo in `film_folder` against every photo in `scene_folder`.
    ///
    /// Results follow film-folder listing order. Unreadable photos never abort
    /// the run; a folder that cannot be listed or an invalid config does.
    pub fn run(
        &self,
        film_folder: &Path,
        scene_folder: &Path,
        config: &MatchConfig,
        reference: &ReferenceTable,
    ) -> Result<MatchRun> {
        config.validate()?;

        let films = self.lister.list(film_folder)?;
        let scenes = self.lister.list(scene_folder)?;
        let stale_references = stale_references(&films, reference);

        info!(
            film_folder = %film_folder.display(),
            scene_folder = %scene_folder.display(),
            film_photos = films.len(),
            scene_photos = scenes.len(),
            reference_entries = reference.len(),
            "Starting match run"
        );
        let started = Instant::now();

        let extractor = OrbExtractor::from_config(config);
        let matcher = PairMatcher::from_config(config);
        let reconciler = Reconciler::from_config(&matcher, config);
        let scene_cache = SceneCache::new(FolderExtractor::new(
            self.loader,
            scene_folder,
            extractor.clone(),
        ));
        let film_failures = Mutex::new(Vec::new());

        let resolve_one = |film_photo: &String| -> Option<MatchResult> {
            if self.is_cancelled() {
                return None;
            }
            let result = reconciler.resolve(
                film_photo,
                || {
                    let image = self.loader.load(&film_folder.join(film_photo)).map_err(|e| {
                        if let Ok(mut failures) = film_failures.lock() {
                            failures.push(e.photo().to_string());
                        }
                        e
                    })?;
                    Ok(Arc::new(extractor.extract(&image)))
                },
                &scenes,
                &scene_cache,
                reference,
            );
            info!(
                film_photo = %result.film_photo,
                scene_photo = result.scene_photo.as_deref().unwrap_or("-"),
                confidence_score = result.confidence_score(),
                confident_match = result.decision.code(),
                "Resolved film photo"
            );
            Some(result)
        };

        let collected: Option<Vec<MatchResult>> = match config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| SceneSyncError::Configuration(format!("thread pool: {e}")))?
                .install(|| films.par_iter().map(resolve_one).collect()),
            None => films.par_iter().map(resolve_one).collect(),
        };
        let results = collected.ok_or(SceneSyncError::Cancelled)?;

        let mut unreadable_photos = film_failures.into_inner().unwrap_or_default();
        unreadable_photos.sort();
        unreadable_photos.extend(scene_cache.failures().iter().map(|e| e.photo().to_string()));

        let summary = RunSummary {
            scene_photos: scenes.len(),
            stale_references,
            unreadable_photos,
            ..RunSummary::tally(&results)
        };

        info!(
            total_matches = summary.total_matches,
            existing_matches = summary.existing_matches,
            new_matches = summary.new_matches,
            unmatched = summary.unmatched,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Match run complete"
        );

        Ok(MatchRun { results, summary })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Reference entries naming film photos absent from the folder.
fn stale_references(films: &[String], reference: &ReferenceTable) -> Vec<String> {
    let present: HashSet<&str> = films.iter().map(String::as_str).collect();
    reference
        .iter()
        .filter(|(film, _)| !present.contains(film))
        .map(|(film, entry)| {
            warn!(
                film_photo = film,
                scene_photo = %entry.scene_photo,
                "Reference entry has no film photo in this folder, skipping"
            );
            film.to_string()
        })
        .collect()
}
