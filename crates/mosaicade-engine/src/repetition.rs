//! Repeated-pick penalty.
//!
//! Tracks how often each unit has been selected during the run and pushes
//! frequently picked units down the ranking, so near-equal candidates get a
//! chance over time.

use std::collections::HashMap;

use mosaicade_descriptor::{sort_by_distance, Ranked, SearchResults, UnitId};
use tracing::debug;

/// Default penalty added per prior selection.
pub const DEFAULT_REPETITION_FACTOR: f64 = 0.02;

/// Per-unit selection counts for one mosaicing run.
#[derive(Debug, Clone)]
pub struct RepetitionCost {
    counts: HashMap<UnitId, u32>,
    factor: f64,
}

impl Default for RepetitionCost {
    fn default() -> Self {
        Self::new(DEFAULT_REPETITION_FACTOR)
    }
}

impl RepetitionCost {
    /// Creates a cost table with the given per-selection penalty factor.
    pub fn new(factor: f64) -> Self {
        Self {
            counts: HashMap::new(),
            factor,
        }
    }

    /// Re-scores results: `adjusted = distance + factor * count`, re-sorted
    /// ascending by the adjusted distance. Unseen references keep their raw
    /// distance.
    pub fn adjust(&self, results: SearchResults) -> SearchResults {
        let mut adjusted: SearchResults = results
            .into_iter()
            .map(|r| {
                let count = self.counts.get(&r.reference).copied().unwrap_or(0);
                Ranked::new(r.distance + self.factor * count as f64, r.reference)
            })
            .collect();
        sort_by_distance(&mut adjusted);
        adjusted
    }

    /// Records a selection. Called *after* the unit is chosen, so a unit's
    /// first occurrence is never self-penalized.
    pub fn record(&mut self, reference: &UnitId) {
        let count = self.counts.entry(reference.clone()).or_insert(0);
        *count += 1;
        debug!(%reference, count = *count, "recorded unit selection");
    }

    /// Times `reference` has been selected so far.
    pub fn count(&self, reference: &UnitId) -> u32 {
        self.counts.get(reference).copied().unwrap_or(0)
    }

    /// Clears all counts. Called at the start of every run.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}
