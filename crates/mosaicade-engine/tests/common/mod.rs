//! Shared mocks and fixture builders for the engine integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use mosaicade_descriptor::{FeatureVector, UnitId};
use mosaicade_engine::{
    Chop, CollabError, Corpus, FeatureExtractor, SourceSegment, SourceUnit, TimeStretch,
};

/// Sample rate used across the fixtures. 1000 Hz keeps millisecond math exact.
pub const RATE: u32 = 1000;

/// Builds a descriptor vector from scalar pairs.
pub fn vector(pairs: &[(&str, f64)]) -> FeatureVector {
    let mut v = FeatureVector::new();
    for (name, value) in pairs {
        v.insert_scalar(*name, *value);
    }
    v
}

/// A constant buffer of `secs` seconds whose every sample equals `marker`.
///
/// The marker doubles as provenance: after assembly, a mosaic region's sample
/// value identifies which fixture buffer it came from.
pub fn audio(marker: f64, secs: f64) -> Vec<f64> {
    vec![marker; (secs * RATE as f64).round() as usize]
}

fn key(marker: f64) -> i64 {
    (marker * 1000.0).round() as i64
}

/// Extractor keyed on the first sample of the analyzed buffer.
///
/// Unknown markers produce an error, which the selector treats as a missing
/// analysis.
#[derive(Default)]
pub struct MarkerExtractor {
    vectors: HashMap<i64, FeatureVector>,
}

impl MarkerExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the vector returned for buffers starting with `marker`.
    pub fn on(mut self, marker: f64, vector: FeatureVector) -> Self {
        self.vectors.insert(key(marker), vector);
        self
    }
}

impl FeatureExtractor for MarkerExtractor {
    fn analyze(&self, samples: &[f64], _sample_rate: u32) -> Result<FeatureVector, CollabError> {
        let marker = samples.first().copied().unwrap_or(f64::NAN);
        self.vectors
            .get(&key(marker))
            .cloned()
            .ok_or_else(|| CollabError::new(format!("no analysis for marker {marker}")))
    }
}

/// Stretcher producing a constant buffer of exactly the target length,
/// preserving the input's marker value.
pub struct FlatStretch;

impl TimeStretch for FlatStretch {
    fn stretch(
        &self,
        samples: &[f64],
        sample_rate: u32,
        target_secs: f64,
    ) -> Result<Vec<f64>, CollabError> {
        let len = (target_secs * sample_rate as f64).round() as usize;
        let value = samples.first().copied().unwrap_or(0.0);
        Ok(vec![value; len])
    }
}

/// In-memory source corpus over one-second constant-marker units.
#[derive(Default)]
pub struct MockCorpus {
    units: Vec<SourceUnit>,
    segments: Option<Vec<SourceSegment>>,
    audio: HashMap<UnitId, Vec<f64>>,
}

impl MockCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a one-second unit with the given descriptors and a constant
    /// audio buffer at `marker`.
    pub fn with_unit(mut self, ordinal: u32, marker: f64, pairs: &[(&str, f64)]) -> Self {
        let id = UnitId::from_ordinal(ordinal);
        self.audio.insert(id.clone(), audio(marker, 1.0));
        self.units.push(SourceUnit {
            id,
            duration: 1.0,
            vector: vector(pairs),
        });
        self
    }

    /// Declares a precomputed high-level grouping for the corpus.
    pub fn with_segments(mut self, segments: Vec<SourceSegment>) -> Self {
        self.segments = Some(segments);
        self
    }
}

impl Corpus for MockCorpus {
    fn units(&self, _chop: &Chop) -> Result<Vec<SourceUnit>, CollabError> {
        Ok(self.units.clone())
    }

    fn high_level(&self, _chop: &Chop) -> Result<Option<Vec<SourceSegment>>, CollabError> {
        Ok(self.segments.clone())
    }

    fn audio(&self, id: &UnitId) -> Result<(Vec<f64>, u32), CollabError> {
        self.audio
            .get(id)
            .map(|samples| (samples.clone(), RATE))
            .ok_or_else(|| CollabError::new(format!("no audio for {id}")))
    }
}
