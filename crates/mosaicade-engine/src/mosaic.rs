//! Mosaic assembly: unit concatenation, crossfading, timestretch, and
//! persistence.

use std::path::Path;

use tracing::{debug, info};

use crate::collab::{AudioIo, TimeStretch};
use crate::error::EngineResult;
use crate::time::{samps_to_secs, secs_to_samps};
use crate::unit::Unit;

/// Default sample rate for empty mosaics, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Linear fade-in gain for sample `i` of an `n`-sample ramp.
fn fade_in_gain(i: usize, n: usize) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}

/// An ordered sequence of units plus the concatenated signal derived from
/// them.
///
/// After every mutation through [`add_unit`](Self::add_unit) or
/// [`merge`](Self::merge), the sample buffer length equals the sum of the
/// constituent unit lengths. [`crossfade`](Self::crossfade) shrinks the
/// buffer by one overlap per boundary and [`timestretch`](Self::timestretch)
/// re-derives it from the stretched units.
#[derive(Debug, Clone, Default)]
pub struct Mosaic {
    units: Vec<Unit>,
    data: Vec<f64>,
    sample_rate: u32,
}

impl Mosaic {
    /// Creates an empty mosaic at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            units: Vec::new(),
            data: Vec::new(),
            sample_rate,
        }
    }

    /// Creates a mosaic directly from a unit sequence.
    pub fn from_units(units: Vec<Unit>) -> Self {
        let sample_rate = units
            .first()
            .map(Unit::sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        let mut mosaic = Self::new(sample_rate);
        for unit in units {
            mosaic.add_unit(unit);
        }
        mosaic
    }

    /// Appends a unit.
    ///
    /// Silent units contribute an exact-length zero buffer; there is no
    /// stored buffer to zero out first.
    pub fn add_unit(&mut self, unit: Unit) {
        self.data.extend(unit.materialize());
        self.units.push(unit);
    }

    /// Merges another mosaic's units onto the end of this one.
    pub fn merge(&mut self, other: Mosaic) {
        for unit in other.units {
            self.add_unit(unit);
        }
    }

    /// Applies a linear crossfade of `overlap_ms` at every unit boundary.
    ///
    /// Each unit gets a fade-in over its first `overlap` samples and a
    /// fade-out over its last `overlap` samples; the fade-out tail of unit
    /// *i* is summed with the fade-in head of unit *i + 1*. When a unit is
    /// shorter than the overlap, the overlap is clamped to that unit's length
    /// for that unit only. Net duration shrinks by one overlap per boundary.
    pub fn crossfade(&mut self, overlap_ms: u32) {
        let overlap = secs_to_samps(overlap_ms as f64 / 1000.0, self.sample_rate);
        debug!(overlap_ms, overlap, "applying crossfade");
        if overlap == 0 || self.units.is_empty() {
            return;
        }

        let mut data: Vec<f64> = Vec::new();
        for (index, unit) in self.units.iter().enumerate() {
            let mut buf = unit.materialize();
            let ov = overlap.min(buf.len());
            if ov < overlap {
                debug!(
                    unit = index,
                    unit_len = buf.len(),
                    "overlap too large, clamping to unit length"
                );
            }
            let n = buf.len();
            for i in 0..ov {
                buf[i] *= fade_in_gain(i, ov);
                buf[n - ov + i] *= 1.0 - fade_in_gain(i, ov);
            }

            if index == 0 {
                data.extend(buf);
            } else {
                let ov = ov.min(data.len());
                let tail = data.len() - ov;
                for i in 0..ov {
                    data[tail + i] += buf[i];
                }
                data.extend_from_slice(&buf[ov..]);
            }
        }
        self.data = data;
    }

    /// Timestretches every unit to `target_secs`, then optionally crossfades.
    ///
    /// When a crossfade is requested, units after the first are stretched to
    /// `target_secs` plus half the crossfade duration, compensating for the
    /// material each subsequent overlap consumes.
    pub fn timestretch(
        &mut self,
        stretcher: &dyn TimeStretch,
        target_secs: f64,
        crossfade_ms: Option<u32>,
    ) -> EngineResult<()> {
        info!(target_secs, ?crossfade_ms, "timestretching mosaic units");
        let mut new_units = Vec::with_capacity(self.units.len());
        for (index, unit) in self.units.iter().enumerate() {
            let mut target = target_secs;
            if index >= 1 {
                if let Some(ms) = crossfade_ms {
                    target += (ms as f64 / 1000.0) / 2.0;
                }
            }
            let stretched = if unit.is_silent() {
                Unit::silent(target, unit.sample_rate())
            } else {
                let stretched =
                    stretcher.stretch(&unit.materialize(), unit.sample_rate(), target)?;
                Unit::real(stretched, unit.sample_rate())
            };
            new_units.push(stretched);
        }
        self.units = new_units;

        match crossfade_ms {
            Some(ms) if ms > 0 => self.crossfade(ms),
            _ => {
                self.data = self
                    .units
                    .iter()
                    .flat_map(|u| u.materialize())
                    .collect();
            }
        }
        Ok(())
    }

    /// Peak-normalises the signal, scaled by `factor`. Acts on the derived
    /// buffer, so it belongs after crossfading and timestretching.
    pub fn normalise(&mut self, factor: f64) {
        let peak = self
            .data
            .iter()
            .fold(0.0_f64, |acc, s| acc.max(s.abs()));
        debug!(peak, factor, "normalising mosaic");
        if peak > 0.0 {
            for s in &mut self.data {
                *s = factor * (*s / peak);
            }
        }
    }

    /// Writes the accumulated signal through the audio-encode collaborator.
    pub fn persist(&self, io: &dyn AudioIo, path: &Path) -> EngineResult<()> {
        info!(path = %path.display(), "persisting mosaic");
        io.write(&self.data, path, self.sample_rate)?;
        Ok(())
    }

    /// A new mosaic holding a copy of `count` units starting at `start`.
    pub fn submosaic(&self, start: usize, count: usize) -> Mosaic {
        let end = (start + count).min(self.units.len());
        let units = self
            .units
            .get(start..end)
            .unwrap_or_default()
            .to_vec();
        let mut sub = Mosaic::new(self.sample_rate);
        for unit in units {
            sub.add_unit(unit);
        }
        sub
    }

    /// The constituent units in order.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// The derived sample buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples in the derived buffer.
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// Duration of the derived buffer in seconds.
    pub fn duration(&self) -> f64 {
        samps_to_secs(self.data.len(), self.sample_rate)
    }

    /// Number of units held.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the mosaic holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
