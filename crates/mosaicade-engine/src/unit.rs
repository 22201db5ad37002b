//! The concatenation building block.

use crate::time::{samps_to_secs, secs_to_samps};

/// The smallest audio span used to assemble a mosaic.
///
/// A `Real` unit carries a sample buffer; a `Silent` unit is a gap filler
/// inserted when a target unit has no analysis (and therefore no match) and
/// carries only a duration. Keeping silence as its own variant rather than a
/// flag on a buffered unit means there is no stale buffer to forget to zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// A materialized span of source audio.
    Real {
        /// Mono sample buffer.
        samples: Vec<f64>,
        /// Sample rate in Hz.
        sample_rate: u32,
    },
    /// A gap filler with no real match.
    Silent {
        /// Duration in seconds.
        duration: f64,
        /// Sample rate in Hz, used to materialize the zero buffer.
        sample_rate: u32,
    },
}

impl Unit {
    /// Creates a real unit from a sample buffer.
    pub fn real(samples: Vec<f64>, sample_rate: u32) -> Self {
        Unit::Real {
            samples,
            sample_rate,
        }
    }

    /// Creates a silent unit of the given duration.
    pub fn silent(duration: f64, sample_rate: u32) -> Self {
        Unit::Silent {
            duration,
            sample_rate,
        }
    }

    /// Whether this unit is a silent gap filler.
    pub fn is_silent(&self) -> bool {
        matches!(self, Unit::Silent { .. })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        match self {
            Unit::Real { sample_rate, .. } | Unit::Silent { sample_rate, .. } => *sample_rate,
        }
    }

    /// Number of samples this unit spans once materialized.
    pub fn sample_count(&self) -> usize {
        match self {
            Unit::Real { samples, .. } => samples.len(),
            Unit::Silent {
                duration,
                sample_rate,
            } => secs_to_samps(*duration, *sample_rate),
        }
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        match self {
            Unit::Real {
                samples,
                sample_rate,
            } => samps_to_secs(samples.len(), *sample_rate),
            Unit::Silent { duration, .. } => *duration,
        }
    }

    /// Materializes the unit's sample buffer. Silent units yield exact-length
    /// zero buffers.
    pub fn materialize(&self) -> Vec<f64> {
        match self {
            Unit::Real { samples, .. } => samples.clone(),
            Unit::Silent { .. } => vec![0.0; self.sample_count()],
        }
    }
}
