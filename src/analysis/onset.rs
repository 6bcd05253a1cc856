//! Onset strength (novelty) computation
//!
//! Produces the activation signal beat tracking runs on: an STFT magnitude
//! spectrogram reduced to half-wave-rectified spectral flux, smoothed and
//! mean-normalized.

use rustfft::{num_complex::Complex, num_traits::Zero, FftPlanner};
use std::f32::consts::PI;

/// Fraction of mean spectral energy the peak flux must exceed before the
/// envelope counts as onset activity
const NOISE_GATE: f32 = 1e-3;

/// Onset strength curve with its frame rate
#[derive(Debug, Clone)]
pub struct OnsetEnvelope {
    /// One value per STFT hop; mean-centered and peak-normalized
    pub values: Vec<f32>,
    /// Frames per second (sample_rate / hop_size)
    pub frame_rate: f32,
}

impl OnsetEnvelope {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time in seconds of a frame index
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 / self.frame_rate as f64
    }
}

/// Compute the onset envelope of a mono signal
///
/// Returns an empty envelope when the signal is shorter than one window.
pub fn onset_envelope(
    samples: &[f32],
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
) -> OnsetEnvelope {
    let window_size = window_size.next_power_of_two();
    let hop = hop_size.max(1);
    let frame_rate = sample_rate as f32 / hop as f32;

    let mut planner = FftPlanner::<f32>::new();
    let window = hann_window(window_size);
    let mags = magnitude_frames(samples, window_size, hop, &mut planner, &window);

    let mut novelty = spectral_flux(&mags);

    // Stationary signals (a steady tone, silence) leave only numerical noise
    // in the flux; peak-normalizing that noise would fabricate onsets. Flux
    // must clear a small fraction of the mean spectral energy to count.
    let mean_energy = if mags.is_empty() {
        0.0
    } else {
        mags.iter().map(|m| m.iter().sum::<f32>()).sum::<f32>() / mags.len() as f32
    };
    let max_flux = novelty.iter().cloned().fold(0.0f32, f32::max);
    if max_flux <= NOISE_GATE * mean_energy {
        return OnsetEnvelope {
            values: vec![0.0; novelty.len()],
            frame_rate,
        };
    }

    smooth_inplace(&mut novelty, 2);
    let values = normalize(&novelty);

    OnsetEnvelope { values, frame_rate }
}

/// Hann window of length n
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}

/// STFT magnitude frames (positive-frequency bins only)
fn magnitude_frames(
    samples: &[f32],
    window_size: usize,
    hop: usize,
    planner: &mut FftPlanner<f32>,
    window: &[f32],
) -> Vec<Vec<f32>> {
    let n = window_size;
    let half = n / 2 + 1;
    let fft = planner.plan_fft_forward(n);
    let mut frames: Vec<Vec<f32>> = Vec::new();

    let mut buf: Vec<Complex<f32>> = vec![Complex::zero(); n];
    let mut pos = 0usize;
    while pos + n <= samples.len() {
        for k in 0..n {
            buf[k].re = samples[pos + k] * window[k];
            buf[k].im = 0.0;
        }
        fft.process(&mut buf);
        let mut mag = vec![0.0f32; half];
        for (b, m) in mag.iter_mut().enumerate() {
            *m = buf[b].norm();
        }
        frames.push(mag);
        pos += hop;
    }
    frames
}

/// Half-wave rectified spectral flux: sum of positive magnitude increases
/// per bin, per frame
fn spectral_flux(frames: &[Vec<f32>]) -> Vec<f32> {
    if frames.len() < 2 {
        return vec![];
    }
    let mut flux = vec![0.0f32; frames.len()];
    for t in 1..frames.len() {
        let prev = &frames[t - 1];
        let cur = &frames[t];
        let mut sum = 0.0f32;
        for (c, p) in cur.iter().zip(prev.iter()) {
            let diff = c - p;
            if diff > 0.0 {
                sum += diff;
            }
        }
        flux[t] = sum;
    }
    flux
}

/// Centered moving average with the given radius
fn smooth_inplace(x: &mut [f32], radius: usize) {
    if radius == 0 || x.is_empty() {
        return;
    }
    let n = x.len();
    let mut out = vec![0.0f32; n];
    for i in 0..n {
        let left = i.saturating_sub(radius);
        let right = (i + radius).min(n - 1);
        let sum: f32 = x[left..=right].iter().sum();
        out[i] = sum / (right - left + 1) as f32;
    }
    x.copy_from_slice(&out);
}

/// Mean-center, then scale so the largest deviation is 1.0
fn normalize(x: &[f32]) -> Vec<f32> {
    if x.is_empty() {
        return vec![];
    }
    let mean = x.iter().sum::<f32>() / x.len() as f32;
    let max_abs = x
        .iter()
        .map(|&v| (v - mean).abs())
        .fold(0.0f32, f32::max);
    if max_abs == 0.0 {
        return vec![0.0f32; x.len()];
    }
    x.iter().map(|&v| (v - mean) / max_abs).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse train at the given period, in samples
    fn click_signal(len: usize, period: usize, sample_rate: u32) -> Vec<f32> {
        let mut signal = vec![0.0f32; len];
        let burst = (0.005 * sample_rate as f32) as usize;
        let mut pos = 0;
        while pos < len {
            for i in 0..burst.min(len - pos) {
                let decay = (-5.0 * i as f32 / burst as f32).exp();
                signal[pos + i] = 0.8 * decay;
            }
            pos += period;
        }
        signal
    }

    #[test]
    fn test_short_signal_yields_empty_envelope() {
        let env = onset_envelope(&[0.0f32; 100], 44100, 2048, 512);
        assert!(env.is_empty());
    }

    #[test]
    fn test_frame_rate() {
        let env = onset_envelope(&vec![0.0f32; 44100], 44100, 2048, 512);
        assert!((env.frame_rate - 86.13).abs() < 0.1);
        assert!(!env.is_empty());
    }

    #[test]
    fn test_clicks_produce_peaks_at_click_frames() {
        let sr = 44100;
        let period = sr as usize / 2; // 2 clicks per second
        let signal = click_signal(sr as usize * 4, period, sr);
        let env = onset_envelope(&signal, sr, 2048, 512);

        // The strongest frames should sit near multiples of the click period
        let frames_per_click = period as f32 / 512.0;
        let mut peaks: Vec<usize> = (1..env.len() - 1)
            .filter(|&i| env.values[i] > 0.5)
            .collect();
        peaks.dedup_by(|a, b| a.abs_diff(*b) < 3);
        assert!(!peaks.is_empty());
        for p in peaks {
            let phase = (p as f32 / frames_per_click).fract();
            let dist = phase.min(1.0 - phase) * frames_per_click;
            assert!(dist < 6.0, "peak at frame {} is {} frames off-grid", p, dist);
        }
    }

    #[test]
    fn test_steady_tone_envelope_is_gated() {
        let sr = 44100u32;
        let samples: Vec<f32> = (0..sr * 3)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sr as f32).sin() * 0.5)
            .collect();
        let env = onset_envelope(&samples, sr, 2048, 512);
        assert!(
            env.values.iter().all(|&v| v == 0.0),
            "a pure tone has no onsets"
        );
    }

    #[test]
    fn test_constant_signal_has_flat_envelope() {
        let env = onset_envelope(&vec![0.5f32; 44100], 44100, 2048, 512);
        // A DC signal has no onsets; flux is zero everywhere
        assert!(env.values.iter().all(|&v| v.abs() < 1e-6));
    }
}
