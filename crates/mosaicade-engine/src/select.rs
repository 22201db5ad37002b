//! The hierarchical selector: drives a whole mosaicing session.
//!
//! For each target segment it queries the search engine, applies the
//! context/repetition re-ranking costs, asks the gridder to time-align the
//! winning unit, and hands the unit to the mosaic assembler. High-level
//! (segment) matching narrows the low-level search to the matched segments'
//! constituent units; flat mode searches the whole corpus index instead.

use std::collections::{HashMap, HashSet};

use mosaicade_descriptor::{
    DescriptorSpace, FeatureVector, Metric, SearchEngine, SearchError, SearchIndex, SearchLevel,
    UnitId,
};
use tracing::{debug, error, info, warn};

use crate::collab::{Corpus, FeatureExtractor, Segmenter, SourceSegment, SourceUnit, TimeStretch};
use crate::config::{Chop, SessionConfig};
use crate::context::Context;
use crate::error::{EngineError, EngineResult};
use crate::gridder::Gridder;
use crate::mosaic::Mosaic;
use crate::repetition::RepetitionCost;
use crate::segment::{group_by_duration, FixedChop, SegmentSpan};
use crate::time::{chop_from_bpm, samps_to_secs};
use crate::unit::Unit;

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No target registered yet.
    Idle,
    /// Target audio registered and analyzed.
    TargetLoaded,
    /// Target split into units (and optionally grouped into segments).
    Segmented,
    /// High-level matches found for every target segment.
    HighLevelMatched,
    /// Iterating target units and appending to the mosaic.
    LowLevelAssembling,
    /// Mosaic assembled and post-processed.
    Done,
}

/// One unit of the segmented target.
///
/// `vector` is `None` when the unit's analysis is missing, which the selector
/// reads as silence. The ordinal establishes temporal sequence and is
/// load-bearing: assembly iterates units in ascending ordinal order.
#[derive(Debug, Clone)]
pub struct TargetUnit {
    /// Reference for the unit (its zero-padded ordinal stem).
    pub id: UnitId,
    /// Temporal position of the unit within the target.
    pub ordinal: u32,
    /// Declared duration in seconds.
    pub duration: f64,
    /// Descriptor vector, or `None` when analysis is missing.
    pub vector: Option<FeatureVector>,
    /// The unit's own audio, used to analyze high-level groupings.
    pub samples: Vec<f64>,
}

impl TargetUnit {
    /// Creates a target unit at the given ordinal.
    pub fn new(
        ordinal: u32,
        duration: f64,
        vector: Option<FeatureVector>,
        samples: Vec<f64>,
    ) -> Self {
        Self {
            id: UnitId::from_ordinal(ordinal),
            ordinal,
            duration,
            vector: vector.map(FeatureVector::stripped),
            samples,
        }
    }
}

/// The registered target recording.
#[derive(Debug, Clone)]
struct Target {
    sample_rate: u32,
    duration: f64,
    bpm: Option<f64>,
    samples: Vec<f64>,
}

/// A high-level grouping of target units with its own descriptor vector.
#[derive(Debug, Clone)]
struct TargetSegment {
    span: SegmentSpan,
    vector: FeatureVector,
}

/// Drives a mosaicing session against a source corpus.
///
/// Run-scoped state (context, repetition counts) is reset at the start of
/// every [`create_mosaic`](Self::create_mosaic) call; a selector must not be
/// shared across concurrently active runs.
pub struct Selector<'a> {
    config: SessionConfig,
    engine: &'a dyn SearchEngine,
    extractor: &'a dyn FeatureExtractor,
    stretcher: &'a dyn TimeStretch,
    corpus: &'a dyn Corpus,
    onset_segmenter: Option<&'a dyn Segmenter>,
    gridder: Gridder,
    context: Context,
    cost: RepetitionCost,
    phase: Phase,
    target: Option<Target>,
    target_chop: Option<Chop>,
    units: Vec<TargetUnit>,
    segments: Vec<TargetSegment>,
}

impl<'a> Selector<'a> {
    /// Creates a selector over the given collaborators.
    pub fn new(
        config: SessionConfig,
        engine: &'a dyn SearchEngine,
        extractor: &'a dyn FeatureExtractor,
        stretcher: &'a dyn TimeStretch,
        corpus: &'a dyn Corpus,
    ) -> Self {
        let gridder = Gridder::new(config.grid.active, config.grid.strategy);
        let cost = RepetitionCost::new(config.repetition_factor);
        Self {
            config,
            engine,
            extractor,
            stretcher,
            corpus,
            onset_segmenter: None,
            gridder,
            context: Context::new(),
            cost,
            phase: Phase::Idle,
            target: None,
            target_chop: None,
            units: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Attaches an onset-detection segmenter, required for `Chop::Onsets`.
    pub fn with_onset_segmenter(mut self, segmenter: &'a dyn Segmenter) -> Self {
        self.onset_segmenter = Some(segmenter);
        self
    }

    /// Current session phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Registers target audio and has the extractor analyze it.
    pub fn set_target(&mut self, samples: Vec<f64>, sample_rate: u32) -> EngineResult<()> {
        let vector = self
            .extractor
            .analyze(&samples, sample_rate)?
            .stripped();
        let bpm = vector.scalar(mosaicade_descriptor::names::BPM);
        let duration = samps_to_secs(samples.len(), sample_rate);
        info!(duration, ?bpm, "target registered");
        self.target = Some(Target {
            sample_rate,
            duration,
            bpm,
            samples,
        });
        self.units.clear();
        self.segments.clear();
        self.target_chop = None;
        self.phase = Phase::TargetLoaded;
        Ok(())
    }

    /// Registers a target that was segmented and analyzed out of process.
    ///
    /// Units are reordered by ordinal; gaps in the ordinal sequence are
    /// treated as missing analysis during assembly. Hierarchical grouping
    /// requires every unit to carry audio and falls back to flat matching
    /// otherwise.
    pub fn set_target_units(
        &mut self,
        mut units: Vec<TargetUnit>,
        sample_rate: u32,
    ) -> EngineResult<()> {
        if units.is_empty() {
            return Err(EngineError::setup("target unit list is empty"));
        }
        units.sort_by_key(|u| u.ordinal);
        let duration = units.iter().map(|u| u.duration).sum();
        let samples: Vec<f64> = units.iter().flat_map(|u| u.samples.clone()).collect();
        self.target = Some(Target {
            sample_rate,
            duration,
            bpm: None,
            samples,
        });
        self.target_chop = Some(self.config.chop.clone());
        self.units = units;
        self.segments.clear();
        if self.config.hierarchical {
            if self.units.iter().all(|u| !u.samples.is_empty()) {
                self.build_target_segments(sample_rate);
            } else {
                warn!("target unit audio unavailable, falling back to flat matching");
            }
        }
        self.phase = Phase::Segmented;
        Ok(())
    }

    /// Segments the target into units and analyzes each one.
    ///
    /// Units whose analysis fails are kept with no vector and will be
    /// rendered as silence; only setup-level failures (no target, no
    /// segmenter for the requested chop) abort.
    pub fn process_target(&mut self) -> EngineResult<()> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| EngineError::setup("target has not been set"))?
            .clone();

        let chop = self.resolve_chop(&target);
        info!(%chop, "segmenting target into units");
        let spans = match &chop {
            Chop::Fixed(ms) => FixedChop::new(*ms).segment(&target.samples, target.sample_rate)?,
            Chop::Onsets => self
                .onset_segmenter
                .ok_or_else(|| {
                    EngineError::setup("onset segmentation requested but no segmenter configured")
                })?
                .segment(&target.samples, target.sample_rate)?,
        };
        if spans.is_empty() {
            return Err(EngineError::setup("target segmentation produced no units"));
        }

        self.units = spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                let samples = target.samples[span.clone()].to_vec();
                let duration = samps_to_secs(samples.len(), target.sample_rate);
                let vector = match self.extractor.analyze(&samples, target.sample_rate) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!(unit = i, error = %e, "unit analysis failed, assuming silence");
                        None
                    }
                };
                TargetUnit::new(i as u32, duration, vector, samples)
            })
            .collect();
        info!(units = self.units.len(), "target units analyzed");

        self.target_chop = Some(chop);
        self.segments.clear();
        if self.config.hierarchical {
            self.build_target_segments(target.sample_rate);
        }
        self.phase = Phase::Segmented;
        Ok(())
    }

    fn resolve_chop(&self, target: &Target) -> Chop {
        if self.config.bpm_sync {
            if let Some(bpm) = target.bpm.filter(|b| *b > 0.0) {
                let ms = chop_from_bpm(bpm);
                info!(bpm, chop_ms = ms, "deriving chop size from target tempo");
                return Chop::Fixed(ms);
            }
            warn!("bpm sync requested but target has no tempo estimate");
        }
        self.config.chop.clone()
    }

    /// Groups target units into >5s segments and analyzes each group's
    /// concatenated audio. On extractor failure the grouping is abandoned
    /// and the run falls back to flat matching.
    fn build_target_segments(&mut self, sample_rate: u32) {
        let durations: Vec<f64> = self.units.iter().map(|u| u.duration).collect();
        let spans = group_by_duration(&durations);
        let mut segments = Vec::with_capacity(spans.len());
        for span in spans {
            let audio: Vec<f64> = self.units[span.range()]
                .iter()
                .flat_map(|u| u.samples.clone())
                .collect();
            match self.extractor.analyze(&audio, sample_rate) {
                Ok(vector) => segments.push(TargetSegment {
                    span,
                    vector: vector.stripped(),
                }),
                Err(e) => {
                    warn!(error = %e, "segment analysis failed, falling back to flat matching");
                    self.segments.clear();
                    return;
                }
            }
        }
        info!(segments = segments.len(), "target grouped into high-level segments");
        self.segments = segments;
    }

    /// Runs the selection loop and assembles the mosaic.
    ///
    /// Context and repetition state are reset at the start; post-processing
    /// (crossfade, or BPM-driven timestretch) is applied at the end. No
    /// unit-level error aborts the run.
    pub fn create_mosaic(&mut self) -> EngineResult<Mosaic> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| EngineError::setup("target has not been set"))?
            .clone();
        if self.units.is_empty() {
            return Err(EngineError::setup("target has not been processed"));
        }

        self.context.reset();
        self.cost.reset();

        let chop = self
            .target_chop
            .clone()
            .unwrap_or_else(|| self.config.chop.clone());
        let source_units = self.corpus.units(&chop)?;
        if source_units.is_empty() {
            return Err(EngineError::setup(format!(
                "source corpus has no units for chop '{chop}'"
            )));
        }
        let catalog: HashMap<UnitId, FeatureVector> = source_units
            .iter()
            .map(|u| (u.id.clone(), u.vector.clone().stripped()))
            .collect();
        let ll_metric = Metric::for_level(SearchLevel::Low, &self.config.constraints);

        let mut mosaic = Mosaic::new(target.sample_rate);
        let units = self.units.clone();
        let segments = self.segments.clone();
        // Ordinals start at zero, so a gap before the first unit is still a
        // gap and gets silence like any other.
        let mut expected = 0u32;
        let mut skipped = 0u32;

        if self.config.hierarchical && !segments.is_empty() {
            self.run_hierarchical(
                &mut mosaic,
                &chop,
                &units,
                &segments,
                &source_units,
                &catalog,
                &ll_metric,
                &mut expected,
                &mut skipped,
            )?;
        } else {
            let entries: Vec<(UnitId, FeatureVector)> =
                catalog.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let index = self.engine.build_index(entries)?;
            self.phase = Phase::LowLevelAssembling;
            self.assemble_units(
                &mut mosaic,
                &units,
                index.as_ref(),
                &ll_metric,
                &catalog,
                &mut expected,
                &mut skipped,
                &[],
            )?;
        }

        info!(
            mosaic_len = mosaic.duration(),
            target_len = target.duration,
            silent_units = skipped,
            "finished looping through target units"
        );

        if self.config.bpm_sync {
            if let Some(Chop::Fixed(ms)) = &self.target_chop {
                info!(chop_ms = ms, "timestretching mosaic onto the tempo grid");
                mosaic.timestretch(
                    self.stretcher,
                    *ms as f64 / 1000.0,
                    self.config.crossfade_ms,
                )?;
            }
        } else if let Some(ms) = self.config.crossfade_ms.filter(|ms| *ms > 0) {
            info!(crossfade_ms = ms, "applying crossfade");
            mosaic.crossfade(ms);
        }

        self.context.reset();
        self.cost.reset();
        self.phase = Phase::Done;
        Ok(mosaic)
    }

    /// High-level phase: match each target segment, merge the matched
    /// segments' children into an ephemeral sub-index, reconcile descriptor
    /// layouts, and assemble that segment's units against the sub-index.
    #[allow(clippy::too_many_arguments)]
    fn run_hierarchical(
        &mut self,
        mosaic: &mut Mosaic,
        chop: &Chop,
        units: &[TargetUnit],
        segments: &[TargetSegment],
        source_units: &[SourceUnit],
        catalog: &HashMap<UnitId, FeatureVector>,
        ll_metric: &Metric,
        expected: &mut u32,
        skipped: &mut u32,
    ) -> EngineResult<()> {
        let source_segments = match self.corpus.high_level(chop)? {
            Some(segs) if !segs.is_empty() => segs,
            _ => {
                let missing = EngineError::missing_index(chop.to_string());
                error!(code = missing.code(), %missing, "building high-level grouping on demand");
                self.build_source_high_level(source_units)?
            }
        };
        let by_id: HashMap<&UnitId, &SourceSegment> =
            source_segments.iter().map(|s| (&s.id, s)).collect();

        let hl_entries: Vec<(UnitId, FeatureVector)> = source_segments
            .iter()
            .map(|s| (s.id.clone(), s.vector.clone()))
            .collect();
        let hl_index = self.engine.build_index(hl_entries)?;
        let hl_metric = Metric::for_level(SearchLevel::High, &self.config.hl_constraints);
        self.phase = Phase::HighLevelMatched;

        for segment in segments {
            let matches = hl_index.query(&hl_metric, &segment.vector, self.config.high_scope)?;
            debug!(
                span = ?segment.span.range(),
                matches = matches.len(),
                "high-level matches for target segment"
            );

            // Merge the matched segments' children into one candidate pool.
            let mut seen: HashSet<UnitId> = HashSet::new();
            let mut entries: Vec<(UnitId, FeatureVector)> = Vec::new();
            for m in &matches {
                let Some(source_segment) = by_id.get(&m.reference) else {
                    error!(reference = %m.reference, "search returned an unknown segment reference, skipping it");
                    continue;
                };
                for member in &source_segment.members {
                    if !seen.insert(member.clone()) {
                        continue;
                    }
                    match catalog.get(member) {
                        Some(vector) => entries.push((member.clone(), vector.clone())),
                        None => warn!(member = %member, "segment member missing from unit catalog"),
                    }
                }
            }

            let segment_units = &units[segment.span.range()];
            if entries.is_empty() {
                warn!(span = ?segment.span.range(), "no candidate units for segment, emitting silence");
                for unit in segment_units {
                    mosaic.add_unit(Unit::silent(unit.duration, mosaic.sample_rate()));
                    *skipped += 1;
                    *expected = (*expected).max(unit.ordinal) + 1;
                }
                continue;
            }

            let mut sub_index = self.engine.build_index(entries)?;

            // Reconcile descriptor layouts per segment: drop from each side
            // whatever is present only on the other.
            let mut target_space = DescriptorSpace::new();
            for unit in segment_units {
                if let Some(vector) = &unit.vector {
                    target_space.merge(&vector.space());
                }
            }
            let source_space = sub_index.layout();
            let source_only = source_space.difference(&target_space);
            let target_only = target_space.difference(&source_space);
            if !source_only.is_empty() || !target_only.is_empty() {
                let mismatch = EngineError::DescriptorMismatch {
                    source_only: source_only.clone(),
                    target_only: target_only.clone(),
                };
                warn!(code = mismatch.code(), %mismatch, "reconciling descriptor layouts");
                sub_index.remove_descriptors(&source_only);
            }

            self.phase = Phase::LowLevelAssembling;
            self.assemble_units(
                mosaic,
                segment_units,
                sub_index.as_ref(),
                ll_metric,
                catalog,
                expected,
                skipped,
                &target_only,
            )?;
        }
        Ok(())
    }

    /// Rebuilds the source corpus's high-level grouping: regroup the units,
    /// concatenate each group's audio, and analyze it.
    fn build_source_high_level(
        &self,
        source_units: &[SourceUnit],
    ) -> EngineResult<Vec<SourceSegment>> {
        let durations: Vec<f64> = source_units.iter().map(|u| u.duration).collect();
        let spans = group_by_duration(&durations);
        if spans.is_empty() {
            return Err(EngineError::setup("source corpus has no units to group"));
        }

        let mut segments = Vec::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            let members: Vec<UnitId> = source_units[span.range()]
                .iter()
                .map(|u| u.id.clone())
                .collect();
            let mut audio = Vec::new();
            let mut rate = crate::mosaic::DEFAULT_SAMPLE_RATE;
            for member in &members {
                let (samples, sample_rate) = self.corpus.audio(member)?;
                audio.extend(samples);
                rate = sample_rate;
            }
            let vector = self.extractor.analyze(&audio, rate)?.stripped();
            segments.push(SourceSegment {
                id: UnitId::from_ordinal(i as u32),
                vector,
                members,
            });
        }
        info!(segments = segments.len(), "built high-level grouping on demand");
        Ok(segments)
    }

    /// Iterates target units in ordinal order and appends one mosaic unit per
    /// ordinal: a match when analysis exists, silence otherwise.
    #[allow(clippy::too_many_arguments)]
    fn assemble_units(
        &mut self,
        mosaic: &mut Mosaic,
        units: &[TargetUnit],
        index: &dyn SearchIndex,
        metric: &Metric,
        catalog: &HashMap<UnitId, FeatureVector>,
        expected: &mut u32,
        skipped: &mut u32,
        drop_from_target: &[String],
    ) -> EngineResult<()> {
        for unit in units {
            // An ordinal gap means descriptor files simply do not exist for
            // those positions: keep alignment by filling each with silence.
            while *expected < unit.ordinal {
                error!(
                    unit = %unit.id,
                    expected = *expected,
                    skipped = *skipped,
                    "missing unit ordinal, inserting silence"
                );
                mosaic.add_unit(Unit::silent(unit.duration, mosaic.sample_rate()));
                *skipped += 1;
                *expected += 1;
            }

            match &unit.vector {
                None => {
                    let err = EngineError::MissingAnalysis {
                        unit: unit.id.clone(),
                    };
                    warn!(code = err.code(), %err, "inserting a silent unit");
                    mosaic.add_unit(Unit::silent(unit.duration, mosaic.sample_rate()));
                    *skipped += 1;
                }
                Some(vector) => {
                    let mut query = vector.clone();
                    query.drop_descriptors(drop_from_target);
                    if let Err(e) = self.select_one(mosaic, unit, &query, index, metric, catalog) {
                        error!(
                            code = e.code(),
                            error = %e,
                            unit = %unit.id,
                            "unit selection failed, inserting silence"
                        );
                        mosaic.add_unit(Unit::silent(unit.duration, mosaic.sample_rate()));
                        *skipped += 1;
                    }
                }
            }
            *expected += 1;
        }
        Ok(())
    }

    /// Selects and appends the best-matching source unit for one target unit.
    fn select_one(
        &mut self,
        mosaic: &mut Mosaic,
        unit: &TargetUnit,
        query: &FeatureVector,
        index: &dyn SearchIndex,
        metric: &Metric,
        catalog: &HashMap<UnitId, FeatureVector>,
    ) -> EngineResult<()> {
        let mut results = index.query(metric, query, self.config.low_scope)?;
        debug!(unit = %unit.id, candidates = results.len(), "low-level search complete");

        if self.config.repetition_cost {
            results = self.cost.adjust(results);
        }
        if self.config.context_cost {
            results = self
                .context
                .adjust(self.engine, results, |id| catalog.get(id))?;
        }

        let chosen = results.first().cloned().ok_or_else(|| {
            EngineError::Search(SearchError::engine("no candidates survived re-ranking"))
        })?;
        debug!(
            unit = %unit.id,
            chosen = %chosen.reference,
            distance = chosen.distance,
            "unit selected"
        );

        let (samples, sample_rate) = self.corpus.audio(&chosen.reference)?;
        let mut picked = Unit::real(samples, sample_rate);
        if self.gridder.is_active() {
            picked = self.gridder.fit(picked, unit.duration, self.stretcher)?;
        }
        mosaic.add_unit(picked);

        if self.config.context_cost {
            if let Some(vector) = catalog.get(&chosen.reference) {
                self.context.append(chosen.reference.clone(), vector.clone());
            }
        }
        if self.config.repetition_cost {
            self.cost.record(&chosen.reference);
        }
        Ok(())
    }
}
