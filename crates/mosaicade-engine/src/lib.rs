//! Mosaicade Engine
//!
//! The unit-selection and assembly core for hierarchical concatenative audio
//! mosaicing. Given a target recording and a pre-analyzed source corpus, the
//! engine selects short source units that track the target's acoustic
//! trajectory at two resolutions (coarse multi-second segments, then fine
//! sub-second units) and concatenates them into a new signal.
//!
//! # Overview
//!
//! A mosaicing run is driven by a [`Selector`]:
//!
//! 1. `set_target` registers the target audio and has the feature-extractor
//!    collaborator analyze it.
//! 2. `process_target` segments the target into units (fixed chop, BPM-derived
//!    chop, or an external onset segmenter), analyzes each unit, and, in
//!    hierarchical mode, groups consecutive units into segments of more than
//!    five seconds for coarse matching.
//! 3. `create_mosaic` performs the two-phase search (segment-level K-NN, then
//!    unit-level K-NN inside the matched segments' merged children), applies
//!    the stateful re-ranking costs ([`RepetitionCost`], [`Context`]), aligns
//!    chosen units to target durations ([`Gridder`]), and assembles the
//!    result into a [`Mosaic`].
//!
//! All collaborator boundaries (feature extraction, similarity search,
//! time-stretch, audio I/O) are traits; the engine is single-threaded and
//! strictly sequential, and relies on collaborators to fail fast rather than
//! hang.
//!
//! # Crate Structure
//!
//! - [`select`] - the hierarchical selector state machine
//! - [`mosaic`] - unit concatenation, crossfade, timestretch, persistence
//! - [`gridder`] - stretch-or-trim/pad duration alignment
//! - [`context`] - bounded-history continuity re-ranking
//! - [`repetition`] - repeated-pick penalty re-ranking
//! - [`segment`] - fixed-chop segmentation and high-level grouping
//! - [`collab`] - collaborator traits and corpus data types
//! - [`config`] - per-run session configuration

pub mod collab;
pub mod config;
pub mod context;
pub mod error;
pub mod gridder;
pub mod mosaic;
pub mod repetition;
pub mod segment;
pub mod select;
pub mod time;
pub mod unit;

pub use collab::{
    AudioIo, CollabError, Corpus, FeatureExtractor, Segmenter, SourceSegment, SourceUnit,
    TimeStretch,
};
pub use config::{Chop, GridConfig, SessionConfig};
pub use context::{Context, CONTEXT_CAPACITY, MIN_CONTEXT};
pub use error::{EngineError, EngineResult};
pub use gridder::{FitStrategy, Gridder};
pub use mosaic::Mosaic;
pub use repetition::{RepetitionCost, DEFAULT_REPETITION_FACTOR};
pub use segment::{group_by_duration, FixedChop, SegmentSpan, SEGMENT_FLOOR_SECS};
pub use select::{Phase, Selector, TargetUnit};
pub use unit::Unit;
