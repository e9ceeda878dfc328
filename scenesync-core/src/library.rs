//! Photo folders on the local filesystem.
//!
//! The engines only see photos through [`FolderLister`] and [`ImageLoader`];
//! [`FsLibrary`] is the implementation backed by `std::fs` and the `image`
//! crate.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::GrayImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result, SceneSyncError};

/// File extensions treated as photos (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// Lists the photo identifiers in a folder.
pub trait FolderLister: Send + Sync {
    /// Photo identifiers (file names) in a stable, sorted order.
    fn list(&self, folder: &Path) -> Result<Vec<String>>;
}

/// Decodes a photo into an 8-bit grayscale image.
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &Path) -> std::result::Result<GrayImage, ExtractionError>;
}

/// Filesystem-backed lister and loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLibrary;

impl FolderLister for FsLibrary {
    fn list(&self, folder: &Path) -> Result<Vec<String>> {
        let unreadable = |source: std::io::Error| SceneSyncError::FolderUnreadable {
            path: folder.to_path_buf(),
            source,
        };

        let mut photos = Vec::new();
        for entry in fs::read_dir(folder).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let path = entry.path();
            if !path.is_file() || !is_supported_image(&path) {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => photos.push(name.to_string()),
                None => warn!(path = %path.display(), "Skipping photo with a non UTF-8 name"),
            }
        }
        photos.sort();

        debug!(folder = %folder.display(), count = photos.len(), "Listed photos");
        Ok(photos)
    }
}

impl ImageLoader for FsLibrary {
    fn load(&self, path: &Path) -> std::result::Result<GrayImage, ExtractionError> {
        let photo = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        image::open(path)
            .map(|img| img.to_luma8())
            .map_err(|e| ExtractionError::image_read(photo, e))
    }
}

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Sub-folders of `base` that hold at least one photo, sorted by name.
///
/// A missing base directory yields an empty list.
pub fn available_folders(base: &Path) -> Result<Vec<String>> {
    if !base.exists() {
        return Ok(Vec::new());
    }

    let unreadable = |source: std::io::Error| SceneSyncError::FolderUnreadable {
        path: base.to_path_buf(),
        source,
    };

    let mut folders = Vec::new();
    for entry in fs::read_dir(base).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if !path.is_dir() {
            continue;
        }
        let has_photos = FsLibrary.list(&path).map(|p| !p.is_empty()).unwrap_or(false);
        if has_photos {
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => folders.push(name.to_string()),
                None => warn!(path = %path.display(), "Skipping folder with a non UTF-8 name"),
            }
        }
    }
    folders.sort();
    Ok(folders)
}

/// Contents of a photo folder, for display before a run.
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    pub folder: PathBuf,
    pub image_count: usize,
    /// Extensions present, lowercase and sorted
    pub formats_found: Vec<String>,
    /// The first photos in listing order
    pub sample: Vec<String>,
}

impl FolderSummary {
    /// Photos not shown in `sample`.
    pub fn remaining(&self) -> usize {
        self.image_count.saturating_sub(self.sample.len())
    }
}

/// Summarise a photo folder, keeping at most `sample_size` names.
pub fn validate_folder(folder: &Path, sample_size: usize) -> Result<FolderSummary> {
    let photos = FsLibrary.list(folder)?;

    let formats_found: BTreeSet<String> = photos
        .iter()
        .filter_map(|p| Path::new(p).extension())
        .filter_map(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .collect();

    Ok(FolderSummary {
        folder: folder.to_path_buf(),
        image_count: photos.len(),
        formats_found: formats_found.into_iter().collect(),
        sample: photos.into_iter().take(sample_size).collect(),
    })
}

/// Create the film, scene and output directories. Returns the paths created
/// or already present.
pub fn setup_directories(
    film_base: &Path,
    scene_base: &Path,
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let dirs = [film_base, scene_base, output];
    for dir in dirs {
        fs::create_dir_all(dir)?;
        info!(path = %dir.display(), "Directory ready");
    }
    Ok(dirs.iter().map(|d| d.to_path_buf()).collect())
}
