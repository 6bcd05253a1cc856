//! Runtime configuration settings
//!
//! The analysis and conversion parameters that the original tool scattered as
//! literals (sample rates, window sizes, extension allow-lists) live here as
//! explicit structs with documented defaults.

use crate::types::{AudioFormat, Operation};
use std::path::{Path, PathBuf};

/// Default extensions eligible for tempo estimation
pub const DEFAULT_ANALYZE_EXTENSIONS: &[&str] =
    &["mp3", "wav", "flac", "m4a", "aac", "ogg", "mp4"];

/// Default extensions eligible for format conversion
pub const DEFAULT_CONVERT_EXTENSIONS: &[&str] =
    &["mp3", "wav", "flac", "m4a", "aac", "ogg", "mp4"];

/// Default spreadsheet file name, written inside the analyzed directory
pub const DEFAULT_EXPORT_FILE: &str = "bpm_output.csv";

/// Name of the conversion output subdirectory in batch mode
pub const CONVERTED_DIR: &str = "converted";

/// Tempo analysis parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Fixed sample rate the waveform is decoded to before analysis
    pub sample_rate: u32,
    /// STFT window size in samples
    pub window_size: usize,
    /// STFT hop size in samples
    pub hop_size: usize,
    /// Lower bound of the tempo search range
    pub min_bpm: f32,
    /// Upper bound of the tempo search range
    pub max_bpm: f32,
    /// RMS level below which the input is treated as silence
    pub silence_threshold: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            window_size: 2048,
            hop_size: 512,
            min_bpm: 40.0,
            max_bpm: 240.0,
            silence_threshold: 1e-5,
        }
    }
}

/// Format conversion parameters
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Target format for re-encoding
    pub target: AudioFormat,
    /// Sample rate forced on WAV output
    pub sample_rate: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target: AudioFormat::Wav,
            sample_rate: 44100,
        }
    }
}

/// Runtime settings for the batch pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Operation applied to each eligible file
    pub operation: Operation,
    /// Spreadsheet output path (analyze mode)
    pub export_path: PathBuf,
    /// Lowercased extensions eligible for the selected operation
    pub allowed_extensions: Vec<String>,
    /// Show the progress bar
    pub show_progress: bool,
    /// Tempo analysis parameters
    pub analysis: AnalysisConfig,
    /// Conversion parameters
    pub convert: ConvertConfig,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let convert = ConvertConfig {
            target: AudioFormat::from_extension(&cli.format).unwrap_or(AudioFormat::Wav),
            ..ConvertConfig::default()
        };

        let operation = match cli.operation.as_str() {
            "convert" => Operation::Convert {
                target: convert.target,
            },
            _ => Operation::EstimateTempo,
        };

        let allowed_extensions = match &cli.extensions {
            Some(list) => list
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            None => default_extensions(operation),
        };

        let export_path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_export_path(&cli.input));

        Self {
            input: cli.input.clone(),
            operation,
            export_path,
            allowed_extensions,
            show_progress: !cli.quiet,
            analysis: AnalysisConfig::default(),
            convert,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            operation: Operation::EstimateTempo,
            export_path: PathBuf::from(".").join(DEFAULT_EXPORT_FILE),
            allowed_extensions: default_extensions(Operation::EstimateTempo),
            show_progress: true,
            analysis: AnalysisConfig::default(),
            convert: ConvertConfig::default(),
        }
    }
}

/// Default allow-list for an operation
fn default_extensions(operation: Operation) -> Vec<String> {
    let list = match operation {
        Operation::EstimateTempo => DEFAULT_ANALYZE_EXTENSIONS,
        Operation::Convert { .. } => DEFAULT_CONVERT_EXTENSIONS,
    };
    list.iter().map(|e| e.to_string()).collect()
}

/// The spreadsheet defaults to a fixed filename inside the analyzed directory
fn default_export_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join(DEFAULT_EXPORT_FILE)
    } else {
        input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_EXPORT_FILE)
    }
}
