//! Brute-force K-NN over normalized in-memory feature vectors.

use std::collections::BTreeMap;

use mosaicade_descriptor::{
    sort_by_distance, DescriptorSpace, FeatureVector, Metric, Ranked, SearchEngine, SearchError,
    SearchIndex, SearchResults, UnitId,
};
use tracing::debug;

/// Per-descriptor normalization statistics, one `(min, range)` per dimension.
#[derive(Debug, Clone)]
struct DimStats {
    min: Vec<f64>,
    range: Vec<f64>,
}

impl DimStats {
    fn normalize(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let min = self.min.get(i).copied().unwrap_or(0.0);
                let range = self.range.get(i).copied().unwrap_or(0.0);
                if range > 0.0 {
                    (v - min) / range
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// The default similarity-search engine: builds [`LinearIndex`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSearchEngine;

impl LinearSearchEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl SearchEngine for LinearSearchEngine {
    fn build_index(
        &self,
        entries: Vec<(UnitId, FeatureVector)>,
    ) -> Result<Box<dyn SearchIndex>, SearchError> {
        Ok(Box::new(LinearIndex::build(entries)))
    }
}

/// An in-memory index over normalized feature vectors.
#[derive(Debug, Clone)]
pub struct LinearIndex {
    entries: Vec<(UnitId, FeatureVector)>,
    layout: DescriptorSpace,
    stats: BTreeMap<String, DimStats>,
}

impl LinearIndex {
    /// Builds an index from `(reference, vector)` pairs.
    pub fn build(entries: Vec<(UnitId, FeatureVector)>) -> Self {
        let mut entries: Vec<(UnitId, FeatureVector)> = entries
            .into_iter()
            .map(|(id, v)| (id, v.stripped()))
            .collect();

        // Keep only descriptors every entry carries, at a consistent arity.
        let mut layout = DescriptorSpace::new();
        if let Some((_, first)) = entries.first() {
            for (name, values) in first.iter() {
                let arity = values.len();
                let shared = entries
                    .iter()
                    .all(|(_, v)| v.get(name).map(<[f64]>::len) == Some(arity));
                if shared {
                    layout.insert(name, arity);
                }
            }
        }
        let dropped: Vec<String> = entries
            .iter()
            .flat_map(|(_, v)| v.descriptor_names().map(str::to_string))
            .filter(|name| !layout.contains(name))
            .collect();
        for (_, vector) in &mut entries {
            vector.drop_descriptors(&dropped);
        }

        let stats = compute_stats(&layout, &entries);
        for (_, vector) in &mut entries {
            let normalized: Vec<(String, Vec<f64>)> = vector
                .iter()
                .map(|(name, values)| (name.to_string(), stats[name].normalize(values)))
                .collect();
            for (name, values) in normalized {
                vector.insert(name, values);
            }
        }
        debug!(
            entries = entries.len(),
            descriptors = layout.names().count(),
            "built linear index"
        );

        Self {
            entries,
            layout,
            stats,
        }
    }

    /// Maps an external point into the index space: restricts it to the
    /// layout and applies the stored normalization.
    fn map_point(&self, point: &FeatureVector) -> FeatureVector {
        let mut mapped = FeatureVector::new();
        for (name, stats) in &self.stats {
            if let Some(values) = point.get(name) {
                mapped.insert(name.clone(), stats.normalize(values));
            }
        }
        mapped
    }
}

fn compute_stats(
    layout: &DescriptorSpace,
    entries: &[(UnitId, FeatureVector)],
) -> BTreeMap<String, DimStats> {
    let mut stats = BTreeMap::new();
    for name in layout.names() {
        let mut min: Vec<f64> = Vec::new();
        let mut max: Vec<f64> = Vec::new();
        for (_, vector) in entries {
            let values = match vector.get(name) {
                Some(v) => v,
                None => continue,
            };
            if min.is_empty() {
                min = values.to_vec();
                max = values.to_vec();
            } else {
                for (i, v) in values.iter().enumerate() {
                    if *v < min[i] {
                        min[i] = *v;
                    }
                    if *v > max[i] {
                        max[i] = *v;
                    }
                }
            }
        }
        let range = min.iter().zip(max.iter()).map(|(lo, hi)| hi - lo).collect();
        stats.insert(name.to_string(), DimStats { min, range });
    }
    stats
}

impl SearchIndex for LinearIndex {
    fn layout(&self) -> DescriptorSpace {
        self.layout.clone()
    }

    fn remove_descriptors(&mut self, names: &[String]) {
        for name in names {
            self.layout.remove(name);
            self.stats.remove(name);
        }
        for (_, vector) in &mut self.entries {
            vector.drop_descriptors(names);
        }
    }

    fn query(
        &self,
        metric: &Metric,
        point: &FeatureVector,
        k: usize,
    ) -> Result<SearchResults, SearchError> {
        if self.entries.is_empty() {
            return Err(SearchError::EmptyIndex);
        }
        let mapped = self.map_point(point);
        if mapped.is_empty() {
            return Err(SearchError::DisjointLayout);
        }

        let mut results: SearchResults = self
            .entries
            .iter()
            .map(|(id, vector)| Ranked::new(metric.distance(&mapped, vector), id.clone()))
            .collect();
        sort_by_distance(&mut results);
        results.truncate(k);
        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
