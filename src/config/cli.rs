//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// bpmsheet - batch tempo analysis for audio folders
///
/// Estimates the tempo (BPM) of every audio file in a folder and writes the
/// results to a CSV spreadsheet, or batch-converts files to normalized WAV.
#[derive(Parser, Debug)]
#[command(name = "bpmsheet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (audio file or directory)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Operation to apply to each eligible file
    #[arg(long, value_name = "OP", default_value = "analyze")]
    #[arg(value_parser = ["analyze", "convert"])]
    pub operation: String,

    /// Conversion target format (convert mode)
    #[arg(long, value_name = "FORMAT", default_value = "wav")]
    #[arg(value_parser = ["wav"])]
    pub format: String,

    /// Spreadsheet output path (defaults to bpm_output.csv in the analyzed directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Comma-separated list of eligible extensions (e.g. "wav,mp3,flac")
    #[arg(long, value_name = "EXTS")]
    pub extensions: Option<String>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bar and non-error output)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
