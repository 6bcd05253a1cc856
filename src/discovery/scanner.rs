//! File discovery and scanning
//!
//! Enumerates regular files directly inside the input directory (no recursion
//! into subdirectories) and filters them against the operation's extension
//! allow-list. Outcome order follows enumeration order; it is not sorted.

use crate::error::{BpmsheetError, Result};
use crate::types::{AudioFile, AudioFormat};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Scan a path (file or directory) for eligible audio files
///
/// `allowed_extensions` holds lowercased extensions without the leading dot.
pub fn scan(input: &Path, allowed_extensions: &[String]) -> Result<Vec<AudioFile>> {
    if !input.exists() {
        return Err(BpmsheetError::FileNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        // Single file mode: an ineligible file is a caller error, not a skip
        if let Some(file) = try_discover_file(input, allowed_extensions) {
            files.push(file);
        } else {
            return Err(BpmsheetError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    } else if input.is_dir() {
        for entry in WalkDir::new(input)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path, allowed_extensions) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    info!("Discovered {} eligible audio files", files.len());

    if files.is_empty() {
        warn!("No eligible audio files found in {}", input.display());
    }

    Ok(files)
}

/// Try to create an AudioFile if the path passes the allow-list and has a
/// recognized audio format
fn try_discover_file(path: &Path, allowed_extensions: &[String]) -> Option<AudioFile> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !allowed_extensions.iter().any(|a| a == &ext) {
        return None;
    }
    let format = AudioFormat::from_extension(&ext)?;

    let metadata = std::fs::metadata(path).ok()?;
    let size_bytes = metadata.len();

    Some(AudioFile {
        path: path.to_path_buf(),
        format,
        size_bytes,
    })
}
