//! Tempo estimation
//!
//! Reduces a beat-timestamp sequence to a single BPM scalar: the median of
//! consecutive inter-beat intervals, as `60.0 / median`, rounded to two
//! decimal places. The median is a deliberate robustness choice - a handful
//! of spurious beats from percussive transients or silence shifts a mean but
//! not a median.

use crate::analysis::tracker::SpectralFluxTracker;
use crate::analysis::traits::BeatTracker;
use crate::audio;
use crate::config::AnalysisConfig;
use crate::error::{BpmsheetError, Result};
use crate::types::{AudioBuffer, TempoOutcome};
use std::path::Path;
use tracing::{debug, warn};

/// Estimates the tempo of audio files
///
/// Decodes to a fixed analysis sample rate, derives beat timestamps through
/// the configured tracker, and reduces them to a `TempoOutcome`. Errors are
/// never propagated out of `estimate` - per-item failures become
/// `Undetermined` outcomes so a batch always continues.
pub struct TempoEstimator {
    tracker: Box<dyn BeatTracker>,
    config: AnalysisConfig,
}

impl TempoEstimator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            tracker: Box::new(SpectralFluxTracker::new(config.clone())),
            config,
        }
    }

    /// Use a custom tracking backend
    pub fn with_tracker(config: AnalysisConfig, tracker: Box<dyn BeatTracker>) -> Self {
        Self { tracker, config }
    }

    /// Estimate the tempo of an audio file
    ///
    /// Decode and tracking failures are logged and mapped to `Undetermined`.
    pub fn estimate(&self, path: &Path) -> TempoOutcome {
        match self.estimate_inner(path) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Tempo estimation failed for {}: {}", path.display(), e);
                TempoOutcome::Undetermined {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn estimate_inner(&self, path: &Path) -> Result<TempoOutcome> {
        let buffer = audio::decode(path, self.config.sample_rate)?;
        debug!(
            "Tracking beats in {} with {} ({:.2}s of audio)",
            path.display(),
            self.tracker.name(),
            buffer.duration
        );
        self.estimate_buffer(&buffer, path)
    }

    /// Estimate from an already-decoded buffer
    pub fn estimate_buffer(&self, buffer: &AudioBuffer, path: &Path) -> Result<TempoOutcome> {
        let beats = self
            .tracker
            .track(buffer)
            .map_err(|e| BpmsheetError::tracking_error(path, e.to_string()))?;

        debug!("{} beats detected", beats.len());

        Ok(match bpm_from_beats(&beats) {
            Some(bpm) => TempoOutcome::Detected(bpm),
            None => TempoOutcome::Undetermined {
                reason: format!("fewer than two usable beats ({} detected)", beats.len()),
            },
        })
    }
}

/// Reduce beat timestamps to a BPM value
///
/// Returns None for fewer than two beats or a degenerate median interval.
pub fn bpm_from_beats(beats: &[f64]) -> Option<f64> {
    if beats.len() < 2 {
        return None;
    }

    let mut intervals: Vec<f64> = beats.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let median_interval = median(&mut intervals);

    if !median_interval.is_finite() || median_interval <= f64::EPSILON {
        return None;
    }

    let bpm = 60.0 / median_interval;
    if !bpm.is_finite() || bpm <= 0.0 {
        return None;
    }

    // Round to 2 decimal places
    Some((bpm * 100.0).round() / 100.0)
}

/// Median of a non-empty slice; averages the two middle values for even
/// lengths
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
