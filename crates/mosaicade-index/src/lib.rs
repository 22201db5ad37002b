//! Mosaicade Linear Similarity Index
//!
//! The default in-process implementation of the search contracts from
//! `mosaicade-descriptor`: a brute-force K-NN scan over an in-memory set of
//! feature vectors. Corpora in a mosaicing session are small (hundreds to a
//! few thousand units), and the engine's two-phase protocol builds many short-
//! lived sub-indices, so construction cost matters more than query
//! asymptotics here.
//!
//! # Construction
//!
//! [`LinearSearchEngine::build_index`] prepares entries the way the engine
//! expects every index to:
//!
//! 1. Strips the fixed excluded-descriptor set from every vector.
//! 2. Restricts the layout to descriptors present in *every* entry (a
//!    descriptor missing from any entry cannot produce comparable distances).
//! 3. Min-max normalizes each descriptor dimension to `[0, 1]` across the
//!    entry set, remembering the statistics so query points can be mapped
//!    into the same space.

pub mod linear;

pub use linear::{LinearIndex, LinearSearchEngine};
