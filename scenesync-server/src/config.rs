//! Server configuration module
//!
//! Loads configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 5001)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Directory holding one sub-folder per batch of film photos
    pub film_base: PathBuf,
    /// Directory holding one sub-folder per batch of scene photos
    pub scene_base: PathBuf,
    /// Directory where result files are written
    pub output_dir: PathBuf,
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 10)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 300, matching runs are slow)
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            host: [127, 0, 0, 1],
            film_base: PathBuf::from("film-photos"),
            scene_base: PathBuf::from("scene-info"),
            output_dir: PathBuf::from("output"),
            allowed_origins: None,
            body_limit_mb: 10,
            timeout_secs: 300,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let path_var = |key: &str, default: PathBuf| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        Self {
            port: parse_var("PORT", defaults.port),
            host,
            film_base: path_var("FILM_BASE", defaults.film_base),
            scene_base: path_var("SCENE_BASE", defaults.scene_base),
            output_dir: path_var("OUTPUT_DIR", defaults.output_dir),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v)),
            body_limit_mb: parse_var("BODY_LIMIT_MB", defaults.body_limit_mb),
            timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
