//! Similarity-search contracts.
//!
//! The mosaicing engine never implements nearest-neighbor search itself; it
//! configures a metric and consumes ranked result lists from an
//! implementation of these traits. `mosaicade-index` provides the default
//! in-process implementation.

use crate::error::SearchError;
use crate::metric::Metric;
use crate::space::{DescriptorSpace, FeatureVector, UnitId};

/// One search hit: a distance paired with the reference it scores.
///
/// Re-ranking passes (repetition cost, context continuity) may replace the
/// distance with an adjusted one, but must keep the pairing intact and
/// re-establish ascending order before handing results on.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// Distance from the query point, ascending is better.
    pub distance: f64,
    /// The entry this distance scores.
    pub reference: UnitId,
}

impl Ranked {
    /// Creates a ranked entry.
    pub fn new(distance: f64, reference: impl Into<UnitId>) -> Self {
        Self {
            distance,
            reference: reference.into(),
        }
    }
}

/// An ordered result list, ascending by distance.
pub type SearchResults = Vec<Ranked>;

/// Re-sorts results ascending by distance, preserving insertion order among
/// equal distances.
pub fn sort_by_distance(results: &mut SearchResults) {
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// A built index over a set of descriptor vectors.
pub trait SearchIndex {
    /// The descriptor layout shared by every entry of the index.
    fn layout(&self) -> DescriptorSpace;

    /// Removes named descriptors from the index layout post-construction.
    ///
    /// Needed by per-segment layout reconciliation, where descriptors present
    /// on only one side of a comparison are dropped from both.
    fn remove_descriptors(&mut self, names: &[String]);

    /// Returns the top-`k` entries nearest to `point` under `metric`,
    /// ascending by distance. The implementation maps `point` into the
    /// index's own descriptor space before comparing.
    fn query(
        &self,
        metric: &Metric,
        point: &FeatureVector,
        k: usize,
    ) -> Result<SearchResults, SearchError>;

    /// Number of entries held.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A similarity-search engine that can build indices on demand.
pub trait SearchEngine {
    /// Builds an index from `(reference, vector)` pairs.
    fn build_index(
        &self,
        entries: Vec<(UnitId, FeatureVector)>,
    ) -> Result<Box<dyn SearchIndex>, SearchError>;
}
