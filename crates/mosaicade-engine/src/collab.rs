//! Collaborator traits and corpus data types.
//!
//! Feature extraction, onset segmentation, time-stretch, and audio I/O are
//! out-of-process concerns. The engine treats them as synchronous blocking
//! calls behind these traits and relies on implementations to fail fast
//! rather than hang; no timeouts are applied here.

use std::ops::Range;
use std::path::Path;

use mosaicade_descriptor::{FeatureVector, UnitId};
use thiserror::Error;

use crate::config::Chop;

/// An error signalled by a collaborator.
///
/// The engine never inspects these beyond logging: during unit-level
/// iteration the affected unit is skipped or replaced by silence, and only
/// setup-level operations propagate the failure.
#[derive(Debug, Error)]
#[error("collaborator error: {message}")]
pub struct CollabError {
    /// What the collaborator reported.
    message: String,
}

impl CollabError {
    /// Creates a collaborator error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reported message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Analyzes audio into a descriptor vector.
///
/// For a given extractor configuration the emitted descriptor key set must be
/// stable across calls, so that metric construction is stable.
pub trait FeatureExtractor {
    /// Analyzes a mono sample buffer.
    fn analyze(&self, samples: &[f64], sample_rate: u32) -> Result<FeatureVector, CollabError>;
}

/// Splits audio into unit spans (sample ranges over the input buffer).
pub trait Segmenter {
    /// Returns consecutive unit spans in temporal order.
    fn segment(&self, samples: &[f64], sample_rate: u32)
        -> Result<Vec<Range<usize>>, CollabError>;
}

/// Resizes a sample buffer to a target duration while approximately
/// preserving pitch and timbre.
pub trait TimeStretch {
    /// Stretches `samples` to `target_secs` at the same sample rate.
    fn stretch(
        &self,
        samples: &[f64],
        sample_rate: u32,
        target_secs: f64,
    ) -> Result<Vec<f64>, CollabError>;
}

/// Reads and writes PCM sample buffers.
pub trait AudioIo {
    /// Reads a mono sample buffer and its sample rate.
    fn read(&self, path: &Path) -> Result<(Vec<f64>, u32), CollabError>;

    /// Writes a mono sample buffer at the given sample rate.
    fn write(&self, samples: &[f64], path: &Path, sample_rate: u32) -> Result<(), CollabError>;
}

/// A pre-analyzed low-level unit of the source corpus.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Corpus reference for the unit.
    pub id: UnitId,
    /// Unit duration in seconds.
    pub duration: f64,
    /// The unit's descriptor vector.
    pub vector: FeatureVector,
}

/// A high-level segment of the source corpus: a run of consecutive units
/// grouped for coarse matching.
#[derive(Debug, Clone)]
pub struct SourceSegment {
    /// Corpus reference for the segment.
    pub id: UnitId,
    /// The segment's own descriptor vector.
    pub vector: FeatureVector,
    /// References of the constituent low-level units, in temporal order.
    pub members: Vec<UnitId>,
}

/// Access to a pre-analyzed source corpus.
///
/// Corpus layout and persistence are collaborator concerns; the engine only
/// consumes unit listings, descriptor vectors, and audio buffers.
pub trait Corpus {
    /// Lists the corpus's low-level units for a chop, ascending by reference
    /// (temporal order within each source file).
    fn units(&self, chop: &Chop) -> Result<Vec<SourceUnit>, CollabError>;

    /// Returns the corpus's high-level segments for a chop, or `None` when no
    /// high-level grouping has been built for it yet.
    fn high_level(&self, chop: &Chop) -> Result<Option<Vec<SourceSegment>>, CollabError>;

    /// Reads the audio of a unit.
    fn audio(&self, id: &UnitId) -> Result<(Vec<f64>, u32), CollabError>;
}
