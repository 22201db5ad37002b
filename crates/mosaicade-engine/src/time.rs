//! Time and sample-count conversions shared across the engine.

/// Converts a duration in seconds to a sample count at the given rate.
pub fn secs_to_samps(secs: f64, sample_rate: u32) -> usize {
    (secs * sample_rate as f64).round() as usize
}

/// Converts a sample count to a duration in seconds.
pub fn samps_to_secs(samples: usize, sample_rate: u32) -> f64 {
    samples as f64 / sample_rate as f64
}

/// Derives a fixed chop size in milliseconds (one beat) from a tempo.
pub fn chop_from_bpm(bpm: f64) -> u32 {
    (60_000.0 / bpm) as u32
}

/// Folds interleaved multi-channel audio down to mono by averaging the first
/// two channels. Mono input is returned unchanged.
pub fn to_mono(interleaved: &[f64], channels: usize) -> Vec<f64> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| 0.5 * (frame[0] + frame.get(1).copied().unwrap_or(frame[0])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secs_to_samps_rounds() {
        assert_eq!(secs_to_samps(1.0, 44100), 44100);
        assert_eq!(secs_to_samps(0.5, 44100), 22050);
        assert_eq!(secs_to_samps(0.0100001, 1000), 10);
    }

    #[test]
    fn samps_to_secs_inverts() {
        assert_eq!(samps_to_secs(44100, 44100), 1.0);
        assert_eq!(samps_to_secs(22050, 44100), 0.5);
    }

    #[test]
    fn chop_from_bpm_is_one_beat_in_ms() {
        assert_eq!(chop_from_bpm(120.0), 500);
        assert_eq!(chop_from_bpm(60.0), 1000);
        // Truncates like integer division.
        assert_eq!(chop_from_bpm(90.0), 666);
    }

    #[test]
    fn to_mono_averages_first_two_channels() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
        let mono = vec![0.25, 0.75];
        assert_eq!(to_mono(&mono, 1), mono);
    }
}
