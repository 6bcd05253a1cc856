//! Unified error types for bpmsheet
//!
//! Error strategy:
//! - Per-file errors (decode, tracking, encode): recoverable, recorded as a
//!   failure outcome or sentinel, batch continues
//! - Setup and export errors (bad input path, spreadsheet write): fatal,
//!   propagate to the caller

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, M4A, AAC, OGG, MP4";

/// Top-level error type for bpmsheet operations
#[derive(Debug, Error)]
pub enum BpmsheetError {
    // =========================================================================
    // Recoverable errors - record outcome, continue batch
    // =========================================================================
    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}\n  Tip: If the file plays in other apps, it may be corrupted or use an unsupported codec")]
    Decode { path: PathBuf, reason: String },

    #[error("Beat tracking failed for '{path}': {reason}")]
    Tracking { path: PathBuf, reason: String },

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Failed to encode '{path}': {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Cannot encode to {target}: only WAV output is supported")]
    EncodeUnsupported { target: String },

    // =========================================================================
    // Fatal errors - abort the run
    // =========================================================================
    #[error("Input path not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    #[error("Cannot write spreadsheet to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    Export { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for bpmsheet operations
pub type Result<T> = std::result::Result<T, BpmsheetError>;

impl BpmsheetError {
    /// Returns true if this error is per-item (record outcome, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BpmsheetError::Decode { .. }
                | BpmsheetError::Tracking { .. }
                | BpmsheetError::UnsupportedFormat { .. }
                | BpmsheetError::Encode { .. }
                | BpmsheetError::EncodeUnsupported { .. }
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BpmsheetError::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a tracking error with context about the issue
    pub fn tracking_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BpmsheetError::Tracking {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an export error, checking for common issues
    pub fn export_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Permission denied. Check that you have write access to {}",
                    path.display()
                )
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                )
            }
            _ => err.to_string(),
        };
        BpmsheetError::Export { path, reason }
    }
}
