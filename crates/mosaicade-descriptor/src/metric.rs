//! Metric configuration: weighted linear combinations of per-descriptor
//! Euclidean distances.
//!
//! A [`Metric`] is pure configuration consumed by the search engine; building
//! one has no side effects. When the caller supplies no weights, the level
//! default applies: a mood-oriented four-term combination for high-level
//! search, or a length/pitch/spectral-energy combination for low-level search.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names;
use crate::space::FeatureVector;

/// Caller-supplied descriptor weights, keyed by descriptor name.
pub type DescriptorWeights = BTreeMap<String, f64>;

/// Which phase of the hierarchical search a metric is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchLevel {
    /// Coarse multi-second segment matching.
    High,
    /// Fine sub-second unit matching.
    Low,
}

/// One term of a metric: a Euclidean distance over a descriptor group,
/// scaled by a weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTerm {
    /// Descriptor names the term spans.
    pub descriptors: Vec<String>,
    /// Weight applied to the term's distance.
    pub weight: f64,
}

impl MetricTerm {
    /// A term over a single descriptor.
    pub fn single(descriptor: impl Into<String>, weight: f64) -> Self {
        Self {
            descriptors: vec![descriptor.into()],
            weight,
        }
    }
}

/// A weighted linear combination of Euclidean distance terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    terms: Vec<MetricTerm>,
}

impl Metric {
    /// Builds a metric from a weight map: one Euclidean term per entry, keyed
    /// by descriptor name, weight taken verbatim.
    pub fn from_weights(weights: &DescriptorWeights) -> Self {
        let terms = weights
            .iter()
            .map(|(name, weight)| MetricTerm::single(name.clone(), *weight))
            .collect();
        Self { terms }
    }

    /// The high-level default: equal-weighted Euclidean terms over the four
    /// independent mood descriptors.
    pub fn mood_default() -> Self {
        Self {
            terms: vec![
                MetricTerm::single(names::MOOD_HAPPY, 1.0),
                MetricTerm::single(names::MOOD_SAD, 1.0),
                MetricTerm::single(names::MOOD_RELAXED, 1.0),
                MetricTerm::single(names::MOOD_AGGRESSIVE, 1.0),
            ],
        }
    }

    /// The low-level default: length (weight 1.0) combined with a joint
    /// pitch/spectral-energy term (weight 0.5).
    pub fn low_level_default() -> Self {
        Self {
            terms: vec![
                MetricTerm::single(names::LENGTH, 1.0),
                MetricTerm {
                    descriptors: vec![
                        names::PITCH_MEAN.to_string(),
                        names::SPECTRAL_ENERGY_MEAN.to_string(),
                    ],
                    weight: 0.5,
                },
            ],
        }
    }

    /// Builds the metric for a search level: caller weights when non-empty,
    /// otherwise the level default.
    pub fn for_level(level: SearchLevel, weights: &DescriptorWeights) -> Self {
        if weights.is_empty() {
            match level {
                SearchLevel::High => Self::mood_default(),
                SearchLevel::Low => Self::low_level_default(),
            }
        } else {
            Self::from_weights(weights)
        }
    }

    /// The terms of the combination.
    pub fn terms(&self) -> &[MetricTerm] {
        &self.terms
    }

    /// Evaluates the metric between two feature vectors.
    ///
    /// Each term contributes `weight * euclidean` over its descriptor group.
    /// A descriptor missing on either side is skipped; dimensions beyond the
    /// shorter of two arities are skipped as well. No term panics on
    /// malformed input.
    pub fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        self.terms
            .iter()
            .map(|term| {
                let mut sum_sq = 0.0;
                for name in &term.descriptors {
                    if let (Some(va), Some(vb)) = (a.get(name), b.get(name)) {
                        for (x, y) in va.iter().zip(vb.iter()) {
                            let d = x - y;
                            sum_sq += d * d;
                        }
                    }
                }
                term.weight * sum_sq.sqrt()
            })
            .sum()
    }
}
