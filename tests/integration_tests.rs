//! Integration tests for the bpmsheet pipeline
//!
//! These tests verify the full batch produces correct spreadsheet output.

use bpmsheet::config::Settings;
use bpmsheet::pipeline::{self, CancelToken};
use bpmsheet::progress::{ChannelProgress, NoopProgress};
use bpmsheet::types::Operation;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Generate a sine wave WAV file for testing
///
/// Creates a mono 16-bit WAV file at the specified path.
fn generate_sine_wav(path: &Path, frequency_hz: f32, duration_secs: f32, sample_rate: u32) {
    use std::f32::consts::PI;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let amplitude = 0.5f32; // 50% amplitude to avoid clipping

    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * PI * frequency_hz * t).sin() * amplitude;
        let sample_i16 = (sample * 32767.0) as i16;
        writer.write_sample(sample_i16).expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Generate a click track WAV file for BPM testing
///
/// Creates impulses (short bursts) at regular intervals matching the
/// specified BPM; a clear rhythmic signal the tracker can lock onto.
fn generate_click_track(path: &Path, bpm: f32, duration_secs: f32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;

    // Impulse duration: ~5ms (short click)
    let impulse_samples = (0.005 * sample_rate as f32) as usize;

    for i in 0..num_samples {
        let position_in_beat = i % samples_per_beat;

        let sample = if position_in_beat < impulse_samples {
            // Exponential decay for a more natural click sound
            let decay = (-5.0 * position_in_beat as f32 / impulse_samples as f32).exp();
            0.8 * decay
        } else {
            0.0
        };

        let sample_i16 = (sample * 32767.0) as i16;
        writer
            .write_sample(sample_i16)
            .expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Parse the exported CSV into (file_name, bpm) pairs, skipping the header
fn read_csv_rows(path: &Path) -> Vec<(String, f64)> {
    let content = fs::read_to_string(path).expect("Failed to read CSV");
    content
        .lines()
        .skip(1)
        .map(|line| {
            let (name, bpm) = line.rsplit_once(',').expect("malformed row");
            (name.to_string(), bpm.parse().expect("BPM not a float"))
        })
        .collect()
}

/// Create test settings with the progress bar disabled
fn create_test_settings(input: &Path) -> Settings {
    Settings {
        input: input.to_path_buf(),
        export_path: input.join("bpm_output.csv"),
        show_progress: false,
        ..Settings::default()
    }
}

#[test]
fn test_pipeline_produces_valid_csv() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");

    let test_wav = input_dir.path().join("click_120.wav");
    generate_click_track(&test_wav, 120.0, 10.0, 44100);

    let settings = create_test_settings(input_dir.path());
    let report = pipeline::run(&settings).expect("Pipeline should succeed");

    assert_eq!(report.total, 1, "Should find 1 file");
    assert_eq!(report.succeeded, 1, "Should successfully analyze 1 file");
    assert_eq!(report.failed, 0, "Should have no failures");

    let csv_path = input_dir.path().join("bpm_output.csv");
    assert!(csv_path.exists(), "bpm_output.csv should exist");

    let content = fs::read_to_string(&csv_path).unwrap();
    assert!(
        content.starts_with("File Name,BPM"),
        "CSV should start with the fixed header"
    );

    let rows = read_csv_rows(&csv_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "click_120.wav");
    assert!(
        (rows[0].1 - 120.0).abs() < 3.0,
        "BPM {} should be near 120",
        rows[0].1
    );
}

#[test]
fn test_end_to_end_valid_and_corrupt_files() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");

    generate_click_track(&input_dir.path().join("good.wav"), 120.0, 10.0, 44100);
    // 0-byte file with an eligible extension
    fs::write(input_dir.path().join("broken.wav"), b"").unwrap();

    let settings = create_test_settings(input_dir.path());
    let report = pipeline::run(&settings).expect("Batch must complete despite the corrupt file");

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);

    let rows = read_csv_rows(&input_dir.path().join("bpm_output.csv"));
    assert_eq!(rows.len(), 2, "One row per eligible file");

    let good = rows.iter().find(|(n, _)| n == "good.wav").unwrap();
    let broken = rows.iter().find(|(n, _)| n == "broken.wav").unwrap();
    assert!((good.1 - 120.0).abs() < 3.0, "BPM {} should be near 120", good.1);
    assert_eq!(broken.1, 0.0, "Corrupt file gets the sentinel");
}

#[test]
fn test_steady_tone_yields_sentinel() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");

    // A pure tone has no onsets, so fewer than two beats are found
    generate_sine_wav(&input_dir.path().join("tone.wav"), 440.0, 5.0, 44100);

    let settings = create_test_settings(input_dir.path());
    pipeline::run(&settings).expect("Pipeline should succeed");

    let rows = read_csv_rows(&input_dir.path().join("bpm_output.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1, 0.0);
}

#[test]
fn test_extension_allow_list_filters_files() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");

    generate_click_track(&input_dir.path().join("in.wav"), 100.0, 6.0, 44100);
    fs::write(input_dir.path().join("skip.mp3"), b"not analyzed").unwrap();
    fs::write(input_dir.path().join("skip.txt"), b"not audio").unwrap();

    let mut settings = create_test_settings(input_dir.path());
    settings.allowed_extensions = vec!["wav".to_string()];

    let report = pipeline::run(&settings).expect("Pipeline should succeed");
    assert_eq!(report.total, 1);

    let rows = read_csv_rows(&input_dir.path().join("bpm_output.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "in.wav");
}

#[test]
fn test_progress_events_reach_total() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");

    generate_click_track(&input_dir.path().join("a.wav"), 120.0, 4.0, 44100);
    fs::write(input_dir.path().join("b.wav"), b"").unwrap();

    let settings = create_test_settings(input_dir.path());

    let (tx, rx) = crossbeam_channel::unbounded();
    let observer = ChannelProgress::new(tx);
    pipeline::run_with_observer(&settings, &observer, &CancelToken::new())
        .expect("Pipeline should succeed");

    let updates: Vec<_> = rx.try_iter().collect();
    assert_eq!(updates.len(), 2);
    assert!(updates.windows(2).all(|p| p[0].completed < p[1].completed));
    let last = updates.last().unwrap();
    assert_eq!(last.completed, 2);
    assert_eq!(last.total, 2);
}

#[test]
fn test_cancelled_run_writes_no_spreadsheet() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");
    generate_click_track(&input_dir.path().join("a.wav"), 120.0, 4.0, 44100);

    let settings = create_test_settings(input_dir.path());
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = pipeline::run_with_observer(&settings, &NoopProgress, &cancel)
        .expect("Cancelled run is not an error");

    assert!(report.outcomes.is_empty());
    assert!(!input_dir.path().join("bpm_output.csv").exists());
}

#[test]
fn test_single_file_mode() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");
    let track = input_dir.path().join("solo.wav");
    generate_click_track(&track, 90.0, 8.0, 44100);

    let mut settings = create_test_settings(&track);
    settings.export_path = input_dir.path().join("bpm_output.csv");

    let report = pipeline::run(&settings).expect("Pipeline should succeed");
    assert_eq!(report.total, 1);

    let rows = read_csv_rows(&settings.export_path);
    assert_eq!(rows.len(), 1);
    assert!((rows[0].1 - 90.0).abs() < 3.0, "BPM {} should be near 90", rows[0].1);
}

#[test]
fn test_conversion_batch_copies_same_format() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");
    let src = input_dir.path().join("keep.wav");
    generate_sine_wav(&src, 440.0, 1.0, 44100);

    let mut settings = create_test_settings(input_dir.path());
    settings.operation = Operation::Convert {
        target: settings.convert.target,
    };

    let report = pipeline::run(&settings).expect("Pipeline should succeed");
    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);

    let copied = input_dir.path().join("converted").join("keep.wav");
    assert!(copied.exists(), "Same-format source is copied, not re-encoded");
    assert!(src.exists(), "Source is never mutated");
    assert_eq!(
        fs::read(&src).unwrap(),
        fs::read(&copied).unwrap(),
        "Copy is byte-identical"
    );
    // Conversion mode writes no spreadsheet
    assert!(!input_dir.path().join("bpm_output.csv").exists());
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let input_dir = TempDir::new().expect("Failed to create temp dir");
    generate_click_track(&input_dir.path().join("a.wav"), 128.0, 8.0, 44100);

    let settings = create_test_settings(input_dir.path());

    pipeline::run(&settings).expect("First run should succeed");
    let first = fs::read_to_string(input_dir.path().join("bpm_output.csv")).unwrap();

    pipeline::run(&settings).expect("Second run should succeed");
    let second = fs::read_to_string(input_dir.path().join("bpm_output.csv")).unwrap();

    assert_eq!(first, second, "Identical input bytes give identical BPM");
}
