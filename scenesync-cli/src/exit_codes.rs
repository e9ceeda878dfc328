//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a bad threshold from a missing folder or a
//! malformed truth file without parsing stderr.

use std::io;

use scenesync_core::SceneSyncError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments or thresholds).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed results, truth or reference file,
/// undecodable image).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input folder or file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the first engine error in the chain
        let code = err
            .chain()
            .find_map(|e| e.downcast_ref::<SceneSyncError>())
            .map(code_for)
            .or_else(|| {
                err.chain()
                    .find_map(|e| e.downcast_ref::<io::Error>())
                    .map(io_code)
            })
            .unwrap_or(GENERAL_ERROR);

        Self::error(code, message)
    }
}

fn code_for(err: &SceneSyncError) -> i32 {
    match err {
        SceneSyncError::Configuration(_) => USAGE_ERROR,
        SceneSyncError::VerificationInput(_)
        | SceneSyncError::Store(_)
        | SceneSyncError::Extraction(_) => DATA_ERROR,
        SceneSyncError::FolderUnreadable { .. } => INPUT_ERROR,
        SceneSyncError::Io(e) => io_code(e),
        SceneSyncError::Cancelled => GENERAL_ERROR,
    }
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::NotFound => INPUT_ERROR,
        _ => IO_ERROR,
    }
}
