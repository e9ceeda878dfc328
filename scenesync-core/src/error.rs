use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneSyncError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot read folder {}: {source}", path.display())]
    FolderUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid verification input: {0}")]
    VerificationInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Match run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to turn a single photo into descriptors.
///
/// Cloneable so a failed scene photo can be cached like a successful one and
/// reported once per film photo without re-reading the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Failed to read image {photo}: {reason}")]
    ImageRead { photo: String, reason: String },
}

impl ExtractionError {
    pub fn image_read(photo: impl Into<String>, reason: impl ToString) -> Self {
        Self::ImageRead {
            photo: photo.into(),
            reason: reason.to_string(),
        }
    }

    /// Identifier of the photo that failed.
    pub fn photo(&self) -> &str {
        match self {
            Self::ImageRead { photo, .. } => photo,
        }
    }
}

impl From<csv::Error> for SceneSyncError {
    fn from(err: csv::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<serde_json::Error> for SceneSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SceneSyncError>;
