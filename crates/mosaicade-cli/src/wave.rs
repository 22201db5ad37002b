//! WAV audio I/O behind the engine's [`AudioIo`] trait.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use mosaicade_engine::time::to_mono;
use mosaicade_engine::{AudioIo, CollabError};
use tracing::debug;

/// Hound-backed WAV reader/writer.
///
/// Reads collapse multi-channel files to mono and normalise integer PCM to
/// [-1.0, 1.0]. Writes are 16-bit mono PCM.
pub struct HoundIo;

impl AudioIo for HoundIo {
    fn read(&self, path: &Path) -> Result<(Vec<f64>, u32), CollabError> {
        let mut reader = WavReader::open(path)
            .map_err(|e| CollabError::new(format!("cannot open {}: {e}", path.display())))?;
        let spec = reader.spec();
        debug!(
            path = %path.display(),
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "reading wav"
        );

        let interleaved: Vec<f64> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<Result<_, _>>(),
            SampleFormat::Int => {
                let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| f64::from(v) / scale))
                    .collect::<Result<_, _>>()
            }
        }
        .map_err(|e| CollabError::new(format!("cannot decode {}: {e}", path.display())))?;

        let mono = if spec.channels > 1 {
            to_mono(&interleaved, spec.channels as usize)
        } else {
            interleaved
        };
        Ok((mono, spec.sample_rate))
    }

    fn write(&self, samples: &[f64], path: &Path, sample_rate: u32) -> Result<(), CollabError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| CollabError::new(format!("cannot create {}: {e}", path.display())))?;
        for &sample in samples {
            let scaled = (sample.clamp(-1.0, 1.0) * f64::from(i16::MAX)) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| CollabError::new(format!("cannot write {}: {e}", path.display())))?;
        }
        writer
            .finalize()
            .map_err(|e| CollabError::new(format!("cannot finalize {}: {e}", path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_audio_reads_back_at_the_same_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f64> = (0..441)
            .map(|i| (i as f64 * 0.05).sin() * 0.5)
            .collect();

        HoundIo.write(&samples, &path, 44100).unwrap();
        let (back, rate) = HoundIo.read(&path).unwrap();

        assert_eq!(rate, 44100);
        assert_eq!(back.len(), samples.len());
        // 16-bit quantisation bounds the round-trip error.
        for (a, b) in samples.iter().zip(&back) {
            assert!((a - b).abs() < 1.0 / 16384.0);
        }
    }

    #[test]
    fn missing_file_is_a_collaborator_error() {
        let err = HoundIo.read(Path::new("/nonexistent/missing.wav")).unwrap_err();
        assert!(err.to_string().contains("missing.wav"));
    }
}
