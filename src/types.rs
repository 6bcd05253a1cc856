//! Core data types for bpmsheet
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats bpmsheet can decode
///
/// MP4 covers the audio track of video containers; M4A is the audio-only
/// variant of the same container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    M4a,
    Aac,
    Ogg,
    Mp4,
}

impl AudioFormat {
    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "m4a" => Some(AudioFormat::M4a),
            "aac" => Some(AudioFormat::Aac),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            "mp4" => Some(AudioFormat::Mp4),
            _ => None,
        }
    }

    /// Canonical extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Aac => "aac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Mp4 => "mp4",
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

// =============================================================================
// Discovered files
// =============================================================================

/// An audio file discovered in the input set
///
/// Immutable once discovered; the format tag is inferred from the extension.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub size_bytes: u64,
}

impl AudioFile {
    /// The bare file name, used for result rows
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

// =============================================================================
// Audio buffer
// =============================================================================

/// Decoded audio samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Operation outcomes
// =============================================================================

/// Result of tempo estimation for one file
///
/// `Undetermined` replaces the bare `0.0` sentinel the export format uses:
/// in memory the failure is explicit and carries its diagnostic, and only
/// `bpm()` collapses it back to the sentinel at the serialization boundary.
/// `Detected` always holds a positive, finite BPM.
#[derive(Debug, Clone, PartialEq)]
pub enum TempoOutcome {
    /// BPM rounded to 2 decimal places
    Detected(f64),
    /// Decode failed, tracking failed, or fewer than two beats were found
    Undetermined { reason: String },
}

impl TempoOutcome {
    /// BPM value for export; `0.0` signals "undetermined"
    pub fn bpm(&self) -> f64 {
        match self {
            TempoOutcome::Detected(bpm) => *bpm,
            TempoOutcome::Undetermined { .. } => 0.0,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, TempoOutcome::Detected(_))
    }
}

/// Result of converting one file
///
/// Conversions never mutate the source file; success carries the newly
/// written (or copied) file. Failures are recorded, not raised - the batch
/// continues.
#[derive(Debug, Clone)]
pub enum ConversionOutcome {
    /// Re-encoded into the target format
    Converted(AudioFile),
    /// Source was already in the target format; returned as-is or byte-copied
    Unchanged(AudioFile),
    /// Decode, encode, or I/O failure with its diagnostic
    Failed { path: PathBuf, reason: String },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ConversionOutcome::Failed { .. })
    }
}

// =============================================================================
// Batch model
// =============================================================================

/// The operation a batch applies to each eligible file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    EstimateTempo,
    Convert { target: AudioFormat },
}

/// Per-file outcome of a batch, in enumeration order
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Tempo {
        file: AudioFile,
        tempo: TempoOutcome,
    },
    Conversion {
        file: AudioFile,
        result: ConversionOutcome,
    },
}

impl ItemOutcome {
    pub fn file(&self) -> &AudioFile {
        match self {
            ItemOutcome::Tempo { file, .. } => file,
            ItemOutcome::Conversion { file, .. } => file,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            ItemOutcome::Tempo { tempo, .. } => tempo.is_detected(),
            ItemOutcome::Conversion { result, .. } => result.is_success(),
        }
    }
}

/// Summary of a completed batch
#[derive(Debug)]
pub struct BatchReport {
    /// Ordered per-file outcomes (enumeration order)
    pub outcomes: Vec<ItemOutcome>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>, total: usize) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            outcomes,
            total,
            succeeded,
            failed,
        }
    }
}

// =============================================================================
// Export rows
// =============================================================================

/// One row of the exported spreadsheet: (original filename, BPM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub file_name: String,
    pub bpm: f64,
}

impl ResultRow {
    pub fn new(file_name: impl Into<String>, bpm: f64) -> Self {
        Self {
            file_name: file_name.into(),
            bpm,
        }
    }
}
