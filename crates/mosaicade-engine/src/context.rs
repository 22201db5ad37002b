//! Local-context continuity re-ranking.
//!
//! A bounded history of recently chosen units re-scores candidates by their
//! aggregate distance to that history, favouring candidates that sit close to
//! what was just played.

use mosaicade_descriptor::{
    sort_by_distance, FeatureVector, Metric, Ranked, SearchEngine, SearchResults, UnitId,
};
use tracing::{debug, warn};

use crate::error::EngineResult;

/// Entries held before the history wraps.
pub const CONTEXT_CAPACITY: usize = 20;

/// Minimum held entries before re-ranking applies. Below this the descriptor
/// set of the ephemeral history index degenerates, so results pass through
/// unchanged.
pub const MIN_CONTEXT: usize = 5;

/// Fixed-capacity ordered collection that overwrites oldest-first once full.
///
/// The behavioral switch from linear append to wrap-around overwrite happens
/// the instant the capacity-th entry is pushed, and the fill state is an
/// explicit flag rather than an emergent property.
#[derive(Debug, Clone)]
pub(crate) struct RingBuffer<T> {
    entries: Vec<T>,
    capacity: usize,
    write: usize,
    filled: bool,
}

impl<T> RingBuffer<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            write: 0,
            filled: false,
        }
    }

    pub(crate) fn push(&mut self, value: T) {
        if self.filled {
            self.entries[self.write] = value;
            self.write = (self.write + 1) % self.capacity;
        } else {
            self.entries.push(value);
            if self.entries.len() == self.capacity {
                self.filled = true;
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.write = 0;
        self.filled = false;
    }
}

/// Bounded history of recently chosen units, with their descriptor vectors.
#[derive(Debug, Clone)]
pub struct Context {
    history: RingBuffer<(UnitId, FeatureVector)>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            history: RingBuffer::new(CONTEXT_CAPACITY),
        }
    }

    /// Pushes a chosen unit into the history.
    pub fn append(&mut self, reference: UnitId, vector: FeatureVector) {
        self.history.push((reference, vector));
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.history.len() == 0
    }

    /// References currently held, oldest slot first.
    pub fn references(&self) -> Vec<UnitId> {
        self.history.iter().map(|(id, _)| id.clone()).collect()
    }

    /// Clears the history. Called at the start of every run.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Re-scores candidates by continuity with the held history.
    ///
    /// Builds an ephemeral index over the held vectors, sums each candidate's
    /// distances to the full held set, adds that sum to the candidate's raw
    /// distance, and re-sorts ascending. With fewer than [`MIN_CONTEXT`]
    /// entries the results are returned unchanged. Candidates whose vector
    /// cannot be resolved are dropped with a warning, never propagated as
    /// errors.
    pub fn adjust<'v>(
        &self,
        engine: &dyn SearchEngine,
        results: SearchResults,
        lookup: impl Fn(&UnitId) -> Option<&'v FeatureVector>,
    ) -> EngineResult<SearchResults> {
        if self.history.len() < MIN_CONTEXT {
            return Ok(results);
        }

        let entries: Vec<(UnitId, FeatureVector)> = self.history.iter().cloned().collect();
        let held = entries.len();
        let index = engine.build_index(entries)?;
        let metric = Metric::low_level_default();

        let mut adjusted: SearchResults = Vec::with_capacity(results.len());
        for r in results {
            let vector = match lookup(&r.reference) {
                Some(v) => v,
                None => {
                    warn!(reference = %r.reference, "no vector for candidate, dropping it");
                    continue;
                }
            };
            let hits = index.query(&metric, vector, held)?;
            let cost: f64 = hits.iter().map(|h| h.distance).sum();
            debug!(reference = %r.reference, cost, "context continuity cost");
            adjusted.push(Ranked::new(r.distance + cost, r.reference));
        }
        sort_by_distance(&mut adjusted);
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaicade_descriptor::names;
    use mosaicade_index::LinearSearchEngine;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn ring_buffer_wraps_at_capacity_exactly() {
        let mut buf: RingBuffer<u32> = RingBuffer::new(20);
        for i in 0..25 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 20);
        // The 21st push overwrote slot 0, the 25th overwrote slot 4.
        let held: Vec<u32> = buf.iter().copied().collect();
        assert_eq!(&held[..5], &[20, 21, 22, 23, 24]);
        assert_eq!(&held[5..], (5..20).collect::<Vec<u32>>().as_slice());
    }

    #[test]
    fn ring_buffer_is_linear_until_full() {
        let mut buf: RingBuffer<u32> = RingBuffer::new(20);
        for i in 0..20 {
            buf.push(i);
        }
        let held: Vec<u32> = buf.iter().copied().collect();
        assert_eq!(held, (0..20).collect::<Vec<u32>>());
    }

    fn vector(length: f64, pitch: f64) -> FeatureVector {
        let mut v = FeatureVector::new();
        v.insert_scalar(names::LENGTH, length);
        v.insert_scalar(names::PITCH_MEAN, pitch);
        v.insert_scalar(names::SPECTRAL_ENERGY_MEAN, 0.5);
        v
    }

    #[test]
    fn sparse_context_passes_results_through() {
        let mut context = Context::new();
        for i in 0..4 {
            context.append(UnitId::from_ordinal(i), vector(0.5, 100.0));
        }
        let results = vec![Ranked::new(0.9, "far"), Ranked::new(0.1, "near")];
        let out = context
            .adjust(&LinearSearchEngine, results.clone(), |_| None)
            .unwrap();
        assert_eq!(out, results);
    }

    #[test]
    fn continuity_prefers_candidates_near_the_history() {
        let engine = LinearSearchEngine;
        let mut context = Context::new();
        // History clusters around length 0.5 / pitch 100.
        for i in 0..6 {
            context.append(UnitId::from_ordinal(i), vector(0.5, 100.0 + i as f64));
        }

        let mut catalog: HashMap<UnitId, FeatureVector> = HashMap::new();
        catalog.insert(UnitId::new("inlier"), vector(0.5, 102.0));
        catalog.insert(UnitId::new("outlier"), vector(3.0, 800.0));

        // The outlier starts slightly ahead on raw distance.
        let results = vec![
            Ranked::new(0.10, "outlier"),
            Ranked::new(0.12, "inlier"),
        ];
        let out = context
            .adjust(&engine, results, |id| catalog.get(id))
            .unwrap();
        assert_eq!(out[0].reference.as_str(), "inlier");
    }

    #[test]
    fn unresolvable_candidates_are_dropped_not_fatal() {
        let engine = LinearSearchEngine;
        let mut context = Context::new();
        for i in 0..5 {
            context.append(UnitId::from_ordinal(i), vector(0.5, 100.0));
        }
        let known = vector(0.5, 101.0);
        let out = context
            .adjust(
                &engine,
                vec![Ranked::new(0.3, "ghost"), Ranked::new(0.4, "known")],
                |id| (id.as_str() == "known").then_some(&known),
            )
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reference.as_str(), "known");
    }

    #[test]
    fn reset_empties_the_history() {
        let mut context = Context::new();
        for i in 0..25 {
            context.append(UnitId::from_ordinal(i), vector(0.5, 100.0));
        }
        assert_eq!(context.len(), CONTEXT_CAPACITY);
        context.reset();
        assert!(context.is_empty());
        assert_eq!(context.references(), Vec::<UnitId>::new());
    }
}
