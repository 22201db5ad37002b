//! Duration alignment of chosen units to the target's rhythmic grid.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collab::TimeStretch;
use crate::error::EngineResult;
use crate::time::secs_to_samps;
use crate::unit::Unit;

/// How a unit is brought to the target duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    /// Resize through the time-stretch collaborator (default).
    Stretch,
    /// Truncate when too long, pad with silence when too short.
    TrimOrPad,
}

/// Fits units to target durations. Stateless with respect to individual
/// units; shared across a run.
#[derive(Debug, Clone, Copy)]
pub struct Gridder {
    active: bool,
    strategy: FitStrategy,
}

impl Default for Gridder {
    fn default() -> Self {
        Self {
            active: false,
            strategy: FitStrategy::Stretch,
        }
    }
}

impl Gridder {
    /// Creates a gridder with the given activation and strategy.
    pub fn new(active: bool, strategy: FitStrategy) -> Self {
        Self { active, strategy }
    }

    /// Whether fitting is applied at all.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Turns fitting on or off, independently of the strategy.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Selects the fitting strategy.
    pub fn set_strategy(&mut self, strategy: FitStrategy) {
        self.strategy = strategy;
    }

    /// Returns `unit` resized to `target_secs`.
    ///
    /// Silent units never reach the stretch collaborator: a zero buffer of
    /// the exact target sample count costs nothing to produce directly.
    pub fn fit(
        &self,
        unit: Unit,
        target_secs: f64,
        stretcher: &dyn TimeStretch,
    ) -> EngineResult<Unit> {
        let sample_rate = unit.sample_rate();
        if unit.is_silent() {
            debug!(target_secs, "unit is silent, skipping the stretch call");
            return Ok(Unit::silent(target_secs, sample_rate));
        }

        match self.strategy {
            FitStrategy::Stretch => {
                debug!(
                    from = unit.duration(),
                    to = target_secs,
                    "stretching unit to target duration"
                );
                let samples = match unit {
                    Unit::Real { samples, .. } => samples,
                    Unit::Silent { .. } => unreachable!("silent handled above"),
                };
                let stretched = stretcher.stretch(&samples, sample_rate, target_secs)?;
                Ok(Unit::real(stretched, sample_rate))
            }
            FitStrategy::TrimOrPad => {
                let target_samps = secs_to_samps(target_secs, sample_rate);
                let mut samples = match unit {
                    Unit::Real { samples, .. } => samples,
                    Unit::Silent { .. } => unreachable!("silent handled above"),
                };
                if samples.len() > target_samps {
                    debug!(target_samps, "trimming unit");
                    samples.truncate(target_samps);
                } else if samples.len() < target_samps {
                    let pad = target_samps - samples.len();
                    debug!(pad, "padding unit with silence");
                    samples.extend(std::iter::repeat(0.0).take(pad));
                }
                Ok(Unit::real(samples, sample_rate))
            }
        }
    }
}
