//! Spectral-flux beat tracker
//!
//! The built-in `BeatTracker` backend: onset envelope -> FFT autocorrelation
//! over the configured tempo range -> octave folding -> comb-filter
//! refinement of the top candidates -> phase-aligned beat picking snapped to
//! local novelty peaks.

use crate::analysis::onset::{onset_envelope, OnsetEnvelope};
use crate::analysis::traits::BeatTracker;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::AudioBuffer;
use rustfft::{num_complex::Complex, num_traits::Zero, FftPlanner};
use std::collections::BTreeMap;
use tracing::debug;

/// Octave-folding lands candidates in this range; tempos outside it are
/// halved/doubled in, which is where most popular music sits
const PREFERRED_MIN_BPM: f32 = 60.0;
const PREFERRED_MAX_BPM: f32 = 200.0;

/// Envelopes shorter than this carry no usable periodicity
const MIN_ENVELOPE_FRAMES: usize = 8;

/// Number of folded candidates to re-score with the comb filter
const REFINE_CANDIDATES: usize = 6;

/// Beat tracker driven by spectral-flux novelty
pub struct SpectralFluxTracker {
    config: AnalysisConfig,
}

impl SpectralFluxTracker {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl Default for SpectralFluxTracker {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl BeatTracker for SpectralFluxTracker {
    fn track(&self, buffer: &AudioBuffer) -> Result<Vec<f64>> {
        if buffer.is_empty() {
            return Ok(vec![]);
        }

        // Silence carries no beats
        let rms = quick_rms(&buffer.samples);
        if rms < self.config.silence_threshold {
            debug!("Input below silence threshold (rms {:.2e})", rms);
            return Ok(vec![]);
        }

        let env = onset_envelope(
            &buffer.samples,
            buffer.sample_rate,
            self.config.window_size,
            self.config.hop_size,
        );
        if env.len() < MIN_ENVELOPE_FRAMES {
            debug!("Envelope too short ({} frames)", env.len());
            return Ok(vec![]);
        }

        let (lag_min, lag_max) =
            bpm_range_to_lag_range(self.config.min_bpm, self.config.max_bpm, env.frame_rate);
        if lag_max <= lag_min + 2 || lag_min >= env.len() {
            return Ok(vec![]);
        }

        let mut planner = FftPlanner::<f32>::new();
        let lag_scores = autocorr_scores(&env.values, lag_min, lag_max, &mut planner);

        let folded = fold_candidates(&lag_scores, env.frame_rate);
        if folded.is_empty() {
            return Ok(vec![]);
        }

        // Comb-refine the strongest folded candidates
        let mut refined: Vec<(f32, f32)> = folded
            .iter()
            .take(REFINE_CANDIDATES)
            .map(|&(bpm, base)| (bpm, comb_score(&env.values, bpm, env.frame_rate) + 0.05 * base))
            .collect();
        refined.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let (bpm, score) = refined[0];
        debug!("Tempo candidate {:.1} BPM (score {:.3})", bpm, score);
        if score <= 0.0 {
            return Ok(vec![]);
        }

        Ok(pick_beats(&env, bpm))
    }

    fn name(&self) -> &'static str {
        "spectral-flux"
    }
}

/// RMS of a mono signal
fn quick_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let acc: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    ((acc / samples.len() as f64) as f32).sqrt()
}

/// Convert a BPM range to an envelope lag range (frames)
fn bpm_range_to_lag_range(min_bpm: f32, max_bpm: f32, frame_rate: f32) -> (usize, usize) {
    let min_bpm = min_bpm.max(1.0);
    let max_bpm = max_bpm.max(min_bpm + 1.0);
    let lag_max = (frame_rate * 60.0 / min_bpm).round() as usize;
    let lag_min = (frame_rate * 60.0 / max_bpm).round() as usize;
    (lag_min.max(1), lag_max.max(lag_min + 1))
}

/// FFT-based autocorrelation restricted to the given lag range
///
/// Scores are normalized by the overlap length so long lags are not
/// penalized.
fn autocorr_scores(
    x: &[f32],
    lag_min: usize,
    lag_max: usize,
    planner: &mut FftPlanner<f32>,
) -> Vec<(usize, f32)> {
    let n = x.len();
    if n == 0 || lag_max < lag_min || lag_min >= n {
        return Vec::new();
    }

    let mut conv = 1usize;
    while conv < n * 2 {
        conv <<= 1;
    }
    let fft = planner.plan_fft_forward(conv);
    let ifft = planner.plan_fft_inverse(conv);

    let mut buf: Vec<Complex<f32>> = vec![Complex::zero(); conv];
    for (i, &v) in x.iter().enumerate() {
        buf[i].re = v;
    }
    fft.process(&mut buf);
    for v in buf.iter_mut() {
        let (re, im) = (v.re, v.im);
        *v = Complex {
            re: re * re + im * im,
            im: 0.0,
        };
    }
    ifft.process(&mut buf);

    let scale = 1.0 / conv as f32;
    let mut out = Vec::with_capacity(lag_max - lag_min + 1);
    for lag in lag_min..=lag_max {
        if lag >= n {
            out.push((lag, 0.0));
            continue;
        }
        let ac = buf[lag].re * scale;
        let denom = (n - lag) as f32;
        out.push((lag, if denom > 0.0 { ac / denom } else { 0.0 }));
    }
    out
}

/// Fold lag scores into BPM candidates within the preferred octave,
/// accumulating harmonically related lags, strongest first
///
/// Ordered map and explicit tie-breaks keep candidate selection
/// deterministic for identical input.
fn fold_candidates(lag_scores: &[(usize, f32)], frame_rate: f32) -> Vec<(f32, f32)> {
    let mut map: BTreeMap<i32, f32> = BTreeMap::new();
    for &(lag, score) in lag_scores {
        if score <= 0.0 {
            continue;
        }
        let bpm_raw = 60.0 * frame_rate / lag as f32;
        if !bpm_raw.is_finite() || bpm_raw <= 0.0 {
            continue;
        }
        let mut bpm = bpm_raw;
        while bpm < PREFERRED_MIN_BPM {
            bpm *= 2.0;
        }
        while bpm > PREFERRED_MAX_BPM {
            bpm *= 0.5;
        }
        // Key at 0.1 BPM resolution so near-identical folds accumulate
        let key = (bpm * 10.0).round() as i32;
        *map.entry(key).or_insert(0.0) += score;
    }

    let mut candidates: Vec<(f32, f32)> = map
        .into_iter()
        .map(|(k, v)| (k as f32 / 10.0, v))
        .collect();
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
    });
    candidates
}

/// Sum of novelty sampled along a beat grid at the given tempo, maximized
/// over phase
fn comb_score(novelty: &[f32], bpm: f32, frame_rate: f32) -> f32 {
    if novelty.is_empty() || bpm <= 0.0 {
        return 0.0;
    }
    let frames_per_beat = 60.0 / bpm * frame_rate;
    if frames_per_beat < 1.0 {
        return 0.0;
    }
    let max_phase = frames_per_beat as usize;
    let mut best = 0.0f32;
    for phase in 0..max_phase.max(1) {
        let mut sum = 0.0f32;
        let mut pos = phase as f32;
        while (pos as usize) < novelty.len() {
            sum += novelty[pos as usize];
            pos += frames_per_beat;
        }
        if sum > best {
            best = sum;
        }
    }
    best
}

/// Lay a beat grid at the winning tempo and phase, snapping each beat to
/// the strongest novelty frame nearby
fn pick_beats(env: &OnsetEnvelope, bpm: f32) -> Vec<f64> {
    let novelty = &env.values;
    let mut beats = Vec::new();
    if novelty.is_empty() || bpm <= 0.0 {
        return beats;
    }
    let frames_per_beat = 60.0 / bpm * env.frame_rate;
    if frames_per_beat < 1.0 {
        return beats;
    }

    // Phase with the most novelty mass under the grid
    let max_phase = (frames_per_beat as usize).max(1);
    let mut best_phase = 0usize;
    let mut best_sum = f32::NEG_INFINITY;
    for phase in 0..max_phase {
        let mut sum = 0.0f32;
        let mut pos = phase as f32;
        while (pos as usize) < novelty.len() {
            sum += novelty[pos as usize];
            pos += frames_per_beat;
        }
        if sum > best_sum {
            best_sum = sum;
            best_phase = phase;
        }
    }

    // Walk the grid, snapping to the local peak within +/-30% of a beat
    let snap = ((frames_per_beat * 0.3).max(2.0)) as isize;
    let mut last_frame: Option<usize> = None;
    let mut pos = best_phase as f32;
    while (pos as usize) < novelty.len() {
        let center = pos as isize;
        let start = (center - snap).max(0) as usize;
        let end = ((center + snap) as usize).min(novelty.len() - 1);
        let mut best_idx = center as usize;
        let mut best_val = novelty[best_idx];
        for (i, &v) in novelty.iter().enumerate().take(end + 1).skip(start) {
            if v > best_val {
                best_val = v;
                best_idx = i;
            }
        }
        // Adjacent grid points can snap to the same peak; keep timestamps
        // strictly ascending
        if last_frame.map_or(true, |f| best_idx > f) {
            beats.push(env.frame_time(best_idx));
            last_frame = Some(best_idx);
        }
        pos += frames_per_beat;
    }

    beats
}
