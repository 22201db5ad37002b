//! Per-run session configuration.
//!
//! Every knob of a mosaicing run lives in one immutable value object handed
//! to the [`Selector`](crate::select::Selector) at construction, rather than
//! in mutable module-level state.

use std::fmt;

use mosaicade_descriptor::DescriptorWeights;
use serde::{Deserialize, Serialize};

use crate::gridder::FitStrategy;

/// Segmentation scheme identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chop {
    /// Onset-based segmentation via the segmenter collaborator.
    Onsets,
    /// Fixed-length segmentation with the given unit size in milliseconds.
    Fixed(u32),
}

impl fmt::Display for Chop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chop::Onsets => write!(f, "onsets"),
            Chop::Fixed(ms) => write!(f, "{ms}"),
        }
    }
}

/// Duration-alignment settings for chosen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Whether chosen units are aligned to target durations at all. When off,
    /// units are appended at their native duration and temporal drift is
    /// accepted.
    pub active: bool,
    /// How alignment is performed.
    pub strategy: FitStrategy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            active: false,
            strategy: FitStrategy::Stretch,
        }
    }
}

/// Configuration for one mosaicing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Segmentation scheme for target and source units.
    pub chop: Chop,
    /// Derive the chop size from the target's tempo (one beat per unit) and
    /// timestretch the finished mosaic onto that grid.
    pub bpm_sync: bool,
    /// Crossfade between concatenated units, in milliseconds. `None` disables
    /// crossfading.
    pub crossfade_ms: Option<u32>,
    /// Whether high-level segment matching narrows the low-level search.
    pub hierarchical: bool,
    /// Candidates retained per high-level search.
    pub high_scope: usize,
    /// Candidates retained per low-level search.
    pub low_scope: usize,
    /// Low-level search constraints: descriptor weights, empty for the
    /// length/pitch/energy default.
    pub constraints: DescriptorWeights,
    /// High-level search constraints: descriptor weights, empty for the mood
    /// default.
    pub hl_constraints: DescriptorWeights,
    /// Whether repeated picks of the same unit are penalized.
    pub repetition_cost: bool,
    /// Penalty added per prior selection of a unit.
    pub repetition_factor: f64,
    /// Whether candidates are re-ranked by continuity with recent picks.
    pub context_cost: bool,
    /// Duration-alignment settings.
    pub grid: GridConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chop: Chop::Onsets,
            bpm_sync: false,
            crossfade_ms: Some(15),
            hierarchical: true,
            high_scope: 5,
            low_scope: 5,
            constraints: DescriptorWeights::new(),
            hl_constraints: DescriptorWeights::new(),
            repetition_cost: false,
            repetition_factor: crate::repetition::DEFAULT_REPETITION_FACTOR,
            context_cost: false,
            grid: GridConfig::default(),
        }
    }
}
