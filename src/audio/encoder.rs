//! WAV encoding using hound
//!
//! The only encode target the stack provides. Output is 16-bit PCM; the
//! converter decides channel count and rate (mono / 44100 Hz for the
//! normalized analysis format).

use crate::error::{BpmsheetError, Result};
use crate::types::AudioBuffer;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Write a mono AudioBuffer as a 16-bit PCM WAV file
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| BpmsheetError::Encode {
        path: path.to_path_buf(),
        reason: format!("Failed to create WAV writer: {}", e),
    })?;

    for &sample in &buffer.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let sample_i16 = (clamped * i16::MAX as f32) as i16;
        writer.write_sample(sample_i16).map_err(|e| BpmsheetError::Encode {
            path: path.to_path_buf(),
            reason: format!("Failed to write sample: {}", e),
        })?;
    }

    writer.finalize().map_err(|e| BpmsheetError::Encode {
        path: path.to_path_buf(),
        reason: format!("Failed to finalize WAV: {}", e),
    })?;

    debug!(
        "Wrote {} samples @ {}Hz to {}",
        buffer.len(),
        buffer.sample_rate,
        path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_wav_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wav");

        let samples: Vec<f32> = (0..441).map(|i| (i as f32 / 441.0) - 0.5).collect();
        let buffer = AudioBuffer::new(samples, 44100);
        write_wav(&buffer, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 441);
    }

    #[test]
    fn test_write_wav_clamps_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hot.wav");

        let buffer = AudioBuffer::new(vec![2.0, -2.0], 44100);
        write_wav(&buffer, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples[0], i16::MAX);
        assert_eq!(samples[1], -i16::MAX);
    }
}
