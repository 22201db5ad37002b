//! Tests for the two-phase hierarchical session: segment matching narrowing
//! the low-level candidate pool, on-demand grouping of the source corpus,
//! and descriptor-layout reconciliation between the two sides.

mod common;

use common::{audio, vector, FlatStretch, MarkerExtractor, MockCorpus, RATE};
use mosaicade_descriptor::{names, UnitId};
use mosaicade_engine::{Chop, Selector, SessionConfig, SourceSegment, TargetUnit};
use mosaicade_index::LinearSearchEngine;
use pretty_assertions::assert_eq;

fn hierarchical_config() -> SessionConfig {
    SessionConfig {
        chop: Chop::Fixed(1000),
        hierarchical: true,
        crossfade_ms: None,
        high_scope: 1,
        ..SessionConfig::default()
    }
}

/// Twelve one-second target units, all asking for a high pitch, grouped into
/// two six-second segments. Unit `i` carries marker `0.31 + 0.01 * i`, so the
/// two segment buffers start at 0.31 and 0.37.
fn high_pitch_target() -> Vec<TargetUnit> {
    (0..12)
        .map(|i| {
            TargetUnit::new(
                i,
                1.0,
                Some(vector(&[(names::PITCH_MEAN, 9.0)])),
                audio(0.31 + 0.01 * i as f64, 1.0),
            )
        })
        .collect()
}

/// A corpus split into a low-pitch pool (units 0..6, markers 0.50..)
/// and a high-pitch pool (units 6..12, markers 0.71..).
fn split_corpus() -> MockCorpus {
    let mut corpus = MockCorpus::new();
    for i in 0..6u32 {
        corpus = corpus.with_unit(
            i,
            0.50 + 0.01 * i as f64,
            &[(names::PITCH_MEAN, 1.0 + 0.1 * i as f64)],
        );
    }
    for i in 0..6u32 {
        corpus = corpus.with_unit(
            6 + i,
            0.71 + 0.01 * i as f64,
            &[(names::PITCH_MEAN, 8.5 + 0.1 * i as f64)],
        );
    }
    corpus
}

fn split_segments() -> Vec<SourceSegment> {
    vec![
        SourceSegment {
            id: UnitId::from_ordinal(0),
            vector: vector(&[(names::MOOD_HAPPY, 1.0)]),
            members: (0..6).map(UnitId::from_ordinal).collect(),
        },
        SourceSegment {
            id: UnitId::from_ordinal(1),
            vector: vector(&[(names::MOOD_HAPPY, 0.0)]),
            members: (6..12).map(UnitId::from_ordinal).collect(),
        },
    ]
}

/// Extractor serving the two target segment vectors: the first group reads
/// as happy, the second as not.
fn segment_extractor() -> MarkerExtractor {
    MarkerExtractor::new()
        .on(0.31, vector(&[(names::MOOD_HAPPY, 1.0)]))
        .on(0.37, vector(&[(names::MOOD_HAPPY, 0.0)]))
}

#[test]
fn segment_matching_restricts_the_low_level_candidate_pool() {
    let corpus = split_corpus().with_segments(split_segments());
    let engine = LinearSearchEngine;
    let extractor = segment_extractor();
    let stretcher = FlatStretch;
    let mut selector = Selector::new(
        hierarchical_config(),
        &engine,
        &extractor,
        &stretcher,
        &corpus,
    );

    selector.set_target_units(high_pitch_target(), RATE).unwrap();
    let mosaic = selector.create_mosaic().unwrap();
    assert_eq!(mosaic.len(), 12);

    let picks: Vec<f64> = mosaic
        .units()
        .iter()
        .map(|u| u.materialize()[0])
        .collect();
    // Every target unit asks for pitch 9.0, which the high-pitch pool could
    // satisfy almost exactly. The first six picks still come from the
    // low-pitch pool because their segment matched the happy grouping; the
    // best that pool offers is its topmost unit (marker 0.55).
    assert_eq!(picks[..6], vec![0.55; 6]);
    assert_eq!(picks[6..], vec![0.76; 6]);
}

#[test]
fn missing_source_grouping_is_rebuilt_on_demand() {
    // No precomputed high-level grouping: the selector regroups the corpus
    // units and analyzes the concatenated audio of each group itself. The
    // group buffers start at the first member's marker, 0.50 and 0.71.
    let corpus = split_corpus();
    let engine = LinearSearchEngine;
    let extractor = segment_extractor()
        .on(0.50, vector(&[(names::MOOD_HAPPY, 1.0)]))
        .on(0.71, vector(&[(names::MOOD_HAPPY, 0.0)]));
    let stretcher = FlatStretch;
    let mut selector = Selector::new(
        hierarchical_config(),
        &engine,
        &extractor,
        &stretcher,
        &corpus,
    );

    selector.set_target_units(high_pitch_target(), RATE).unwrap();
    let mosaic = selector.create_mosaic().unwrap();

    let picks: Vec<f64> = mosaic
        .units()
        .iter()
        .map(|u| u.materialize()[0])
        .collect();
    assert_eq!(picks[..6], vec![0.55; 6]);
    assert_eq!(picks[6..], vec![0.76; 6]);
}

#[test]
fn mismatched_descriptor_layouts_are_reconciled_per_segment() {
    // Source units carry a loudness descriptor the target lacks; target
    // units carry a salience descriptor the source lacks. Both sides must
    // be pruned to the shared layout or every query would fail.
    let mut corpus = MockCorpus::new();
    for (i, pitch) in [1.0, 3.0, 5.0].into_iter().enumerate() {
        corpus = corpus.with_unit(
            i as u32,
            0.50 + 0.01 * i as f64,
            &[(names::PITCH_MEAN, pitch), ("loudness.mean", 0.2)],
        );
    }
    let corpus = corpus.with_segments(vec![SourceSegment {
        id: UnitId::from_ordinal(0),
        vector: vector(&[(names::MOOD_HAPPY, 1.0)]),
        members: (0..3).map(UnitId::from_ordinal).collect(),
    }]);

    let target: Vec<TargetUnit> = (0..6)
        .map(|i| {
            TargetUnit::new(
                i,
                1.0,
                Some(vector(&[
                    (names::PITCH_MEAN, 1.4),
                    ("pitch.salience", 0.4),
                ])),
                audio(0.31 + 0.01 * i as f64, 1.0),
            )
        })
        .collect();

    let engine = LinearSearchEngine;
    let extractor = MarkerExtractor::new().on(0.31, vector(&[(names::MOOD_HAPPY, 1.0)]));
    let stretcher = FlatStretch;
    let mut selector = Selector::new(
        hierarchical_config(),
        &engine,
        &extractor,
        &stretcher,
        &corpus,
    );

    selector.set_target_units(target, RATE).unwrap();
    let mosaic = selector.create_mosaic().unwrap();

    assert_eq!(mosaic.len(), 6);
    // All six picks resolve on pitch alone to the nearest unit, never to
    // silence.
    for unit in mosaic.units() {
        assert!(!unit.is_silent());
        assert_eq!(unit.materialize()[0], 0.50);
    }
}

#[test]
fn a_segment_with_no_known_members_is_rendered_silent() {
    // The happy grouping's members do not exist in the unit catalog, so the
    // first target segment has an empty candidate pool. Its units become
    // silence while the second segment still resolves normally.
    let corpus = split_corpus().with_segments(vec![
        SourceSegment {
            id: UnitId::from_ordinal(0),
            vector: vector(&[(names::MOOD_HAPPY, 1.0)]),
            members: (100..106).map(UnitId::from_ordinal).collect(),
        },
        SourceSegment {
            id: UnitId::from_ordinal(1),
            vector: vector(&[(names::MOOD_HAPPY, 0.0)]),
            members: (6..12).map(UnitId::from_ordinal).collect(),
        },
    ]);
    let engine = LinearSearchEngine;
    let extractor = segment_extractor();
    let stretcher = FlatStretch;
    let mut selector = Selector::new(
        hierarchical_config(),
        &engine,
        &extractor,
        &stretcher,
        &corpus,
    );

    selector.set_target_units(high_pitch_target(), RATE).unwrap();
    let mosaic = selector.create_mosaic().unwrap();

    assert_eq!(mosaic.len(), 12);
    assert_eq!(mosaic.sample_count(), 12 * RATE as usize);
    for unit in &mosaic.units()[..6] {
        assert!(unit.is_silent());
    }
    let picks: Vec<f64> = mosaic.units()[6..]
        .iter()
        .map(|u| u.materialize()[0])
        .collect();
    assert_eq!(picks, vec![0.76; 6]);
}

#[test]
fn extractor_failure_on_a_segment_falls_back_to_flat_matching() {
    let corpus = split_corpus().with_segments(split_segments());
    let engine = LinearSearchEngine;
    // No segment vectors registered: grouping analysis fails and the run
    // degrades to a whole-corpus search.
    let extractor = MarkerExtractor::new();
    let stretcher = FlatStretch;
    let mut selector = Selector::new(
        hierarchical_config(),
        &engine,
        &extractor,
        &stretcher,
        &corpus,
    );

    selector.set_target_units(high_pitch_target(), RATE).unwrap();
    let mosaic = selector.create_mosaic().unwrap();

    let picks: Vec<f64> = mosaic
        .units()
        .iter()
        .map(|u| u.materialize()[0])
        .collect();
    // With the whole corpus in play, pitch 9.0 resolves to the closest
    // high-pitch unit for every target unit.
    assert_eq!(picks, vec![0.76; 12]);
}
