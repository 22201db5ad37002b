//! Mosaicade Descriptor Library
//!
//! This crate provides the data model shared between the mosaicing engine and
//! its similarity-search collaborator:
//!
//! - **Descriptor spaces and feature vectors**: named sets of scalar or
//!   fixed-arity vector dimensions (dotted names such as `rhythm.bpm` or
//!   `highlevel.mood_happy.all.happy`), as emitted by a feature extractor.
//! - **Metrics**: weighted linear combinations of per-descriptor Euclidean
//!   distances, either built from a caller-supplied weight map or from one of
//!   the two domain defaults (mood for high-level search, length/pitch/energy
//!   for low-level search).
//! - **Search contracts**: the [`SearchEngine`] / [`SearchIndex`] traits a
//!   similarity-search implementation must satisfy, and the [`Ranked`] result
//!   ordering contract (ascending by distance, distance paired with its
//!   reference).
//!
//! # Example
//!
//! ```
//! use mosaicade_descriptor::{names, FeatureVector, Metric};
//!
//! let mut a = FeatureVector::new();
//! a.insert_scalar(names::LENGTH, 0.5);
//! a.insert_scalar(names::PITCH_MEAN, 220.0);
//!
//! let mut b = a.clone();
//! b.insert_scalar(names::LENGTH, 0.75);
//!
//! let metric = Metric::low_level_default();
//! assert!(metric.distance(&a, &b) > 0.0);
//! ```

pub mod error;
pub mod metric;
pub mod names;
pub mod search;
pub mod space;

pub use error::SearchError;
pub use metric::{DescriptorWeights, Metric, MetricTerm, SearchLevel};
pub use search::{sort_by_distance, Ranked, SearchEngine, SearchIndex, SearchResults};
pub use space::{DescriptorSpace, FeatureVector, UnitId, EXCLUDED_DESCRIPTORS};
