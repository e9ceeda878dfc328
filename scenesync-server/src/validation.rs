//! Request validation module
//!
//! Folder and file names arrive from clients and are joined onto the
//! configured base directories, so each must be a single plain path segment.

use std::path::{Component, Path, PathBuf};

use crate::error::ApiError;

/// Join a client-supplied name onto `base`.
///
/// Rejects empty names, absolute paths, `.`/`..` and anything with a path
/// separator.
pub fn resolve_name(base: &Path, name: &str, field: &str) -> Result<PathBuf, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == trimmed => Ok(base.join(segment)),
        _ => Err(ApiError::bad_request(format!(
            "{field} must be a plain name inside its base directory, got '{name}'"
        ))),
    }
}
