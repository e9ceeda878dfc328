//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Base directory for film photo folders
    pub film_base: Arc<Path>,
    /// Base directory for scene photo folders
    pub scene_base: Arc<Path>,
    /// Directory receiving result files
    pub output_dir: Arc<Path>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            film_base: Arc::from(config.film_base.as_path()),
            scene_base: Arc::from(config.scene_base.as_path()),
            output_dir: Arc::from(config.output_dir.as_path()),
        }
    }
}
