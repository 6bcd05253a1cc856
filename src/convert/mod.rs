//! Format conversion
//!
//! Converts audio files to a normalized target format. Sources already in
//! the target format are passed through (or byte-copied into the destination
//! directory), never re-encoded. WAV output is forced to mono at the
//! configured sample rate, the layout downstream tempo analysis expects.
//!
//! Conversion failures are recorded in the outcome and never raised; the
//! source file is never mutated.

use crate::audio;
use crate::config::ConvertConfig;
use crate::error::{BpmsheetError, Result};
use crate::types::{AudioFile, AudioFormat, ConversionOutcome};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Convert one file toward the configured target format
///
/// `dest_dir` selects batch mode: `Some` writes into that directory
/// (created if absent), `None` writes next to the source.
pub fn convert(file: &AudioFile, config: &ConvertConfig, dest_dir: Option<&Path>) -> ConversionOutcome {
    match convert_inner(file, config, dest_dir) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Conversion failed for {}: {}", file.path.display(), e);
            ConversionOutcome::Failed {
                path: file.path.clone(),
                reason: e.to_string(),
            }
        }
    }
}

fn convert_inner(
    file: &AudioFile,
    config: &ConvertConfig,
    dest_dir: Option<&Path>,
) -> Result<ConversionOutcome> {
    // Already in the target format: pass through or copy, never re-encode
    if file.format == config.target {
        return match dest_dir {
            None => {
                debug!("{} already {}", file.path.display(), config.target.extension());
                Ok(ConversionOutcome::Unchanged(file.clone()))
            }
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let out_path = dir.join(file.path.file_name().unwrap_or_default());
                std::fs::copy(&file.path, &out_path)?;
                Ok(ConversionOutcome::Unchanged(discovered(out_path, config.target)))
            }
        };
    }

    if config.target != AudioFormat::Wav {
        return Err(BpmsheetError::EncodeUnsupported {
            target: config.target.extension().to_string(),
        });
    }

    // Decode (mono, normalized rate) and re-encode as WAV
    let buffer = audio::decode(&file.path, config.sample_rate)?;

    let out_path = output_path(&file.path, config.target, dest_dir)?;
    audio::write_wav(&buffer, &out_path)?;

    debug!(
        "Converted {} -> {}",
        file.path.display(),
        out_path.display()
    );

    Ok(ConversionOutcome::Converted(discovered(out_path, config.target)))
}

/// Path with the target extension, inside `dest_dir` or next to the source
fn output_path(source: &Path, target: AudioFormat, dest_dir: Option<&Path>) -> Result<PathBuf> {
    let file_name = source
        .with_extension(target.extension())
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| BpmsheetError::Config(format!("Bad source path: {}", source.display())))?;

    match dest_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.join(file_name))
        }
        None => Ok(source.with_extension(target.extension())),
    }
}

fn discovered(path: PathBuf, format: AudioFormat) -> AudioFile {
    let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    AudioFile {
        path,
        format,
        size_bytes,
    }
}
