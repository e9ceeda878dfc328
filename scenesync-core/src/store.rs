//! Result, reference and truth files.
//!
//! Every file is CSV with a header row unless its extension is `.json`, in
//! which case it is a JSON array of objects with the same field names.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SceneSyncError};
use crate::reference::ReferenceTable;
use crate::result::{MatchRecord, MatchResult, CODE_UNCERTAIN};
use crate::verify::{PhotoPair, TruthRecord};

const FILM_COLUMN: &str = "film_photo";
const SCENE_COLUMN: &str = "scene_photo";

/// Score given to reference rows that carry none.
pub const DEFAULT_REFERENCE_SCORE: f64 = 1.0;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Write a run's results, creating parent directories as needed.
pub fn write_results(path: &Path, results: &[MatchResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let records: Vec<MatchRecord> = results.iter().map(MatchRecord::from).collect();
    let file = File::create(path)?;

    if is_json(path) {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    } else {
        let mut writer = csv::Writer::from_writer(file);
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }

    info!(path = %path.display(), rows = records.len(), "Wrote results");
    Ok(())
}

/// Read results written by [`write_results`].
pub fn read_results(path: &Path) -> Result<Vec<MatchResult>> {
    read_rows::<MatchRecord>(
        path,
        &[FILM_COLUMN, SCENE_COLUMN, "confidence_score", "confident_match"],
    )?
        .into_iter()
        .map(MatchResult::try_from)
        .collect()
}

/// Read film/scene pairs from any table with `film_photo` and `scene_photo`
/// columns. Rows with an empty side are skipped; other columns are ignored.
pub fn read_pairs(path: &Path) -> Result<Vec<PhotoPair>> {
    #[derive(Deserialize)]
    struct PairRow {
        film_photo: String,
        #[serde(default)]
        scene_photo: Option<String>,
    }

    let pairs: Vec<PhotoPair> = read_rows::<PairRow>(path, &[FILM_COLUMN, SCENE_COLUMN])?
        .into_iter()
        .filter_map(|row| {
            let scene = row.scene_photo.unwrap_or_default();
            let (film, scene) = (row.film_photo.trim(), scene.trim());
            (!film.is_empty() && !scene.is_empty()).then(|| PhotoPair::new(film, scene))
        })
        .collect();

    debug!(path = %path.display(), pairs = pairs.len(), "Read pairs");
    Ok(pairs)
}

/// Read a ground-truth table.
pub fn read_truth(path: &Path) -> Result<Vec<TruthRecord>> {
    read_pairs(path)
}

/// Read a reference table of confirmed pairings.
///
/// Rows with no scene photo or with `confident_match = 0` are not confirmed
/// and are ignored. A missing `confidence_score` defaults to
/// [`DEFAULT_REFERENCE_SCORE`].
pub fn read_reference(path: &Path) -> Result<ReferenceTable> {
    #[derive(Deserialize)]
    struct ReferenceRow {
        film_photo: String,
        #[serde(default)]
        scene_photo: Option<String>,
        #[serde(default)]
        confidence_score: Option<f64>,
        #[serde(default)]
        confident_match: Option<i8>,
    }

    let mut table = ReferenceTable::new();
    let mut skipped = 0usize;

    for row in read_rows::<ReferenceRow>(path, &[FILM_COLUMN, SCENE_COLUMN])? {
        let film = row.film_photo.trim();
        let scene = row.scene_photo.as_deref().map(str::trim).unwrap_or_default();
        if film.is_empty() || scene.is_empty() || row.confident_match == Some(CODE_UNCERTAIN) {
            skipped += 1;
            continue;
        }
        table.insert(
            film,
            scene,
            row.confidence_score.unwrap_or(DEFAULT_REFERENCE_SCORE),
        )?;
    }

    info!(
        path = %path.display(),
        entries = table.len(),
        skipped,
        "Loaded reference table"
    );
    Ok(table)
}

fn read_rows<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let file = File::open(path)?;

    if is_json(path) {
        return Ok(serde_json::from_reader(BufReader::new(file))?);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == col))
        .collect();
    if !missing.is_empty() {
        return Err(SceneSyncError::Store(format!(
            "{} must contain columns {:?}, missing {:?}. Found: {:?}",
            path.display(),
            required,
            missing,
            headers
        )));
    }

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| {
                SceneSyncError::Store(format!("{} row {}: {e}", path.display(), i + 2))
            })
        })
        .collect()
}
