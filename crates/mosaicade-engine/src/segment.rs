//! Fixed-length segmentation and high-level grouping.

use std::ops::Range;

use tracing::{debug, warn};

use crate::collab::{CollabError, Segmenter};
use crate::time::secs_to_samps;

/// Cumulative duration a high-level group must exceed, in seconds.
pub const SEGMENT_FLOOR_SECS: f64 = 5.0;

/// A run of consecutive low-level units grouped for high-level matching,
/// expressed as indices into the unit sequence it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpan {
    /// Index of the first unit in the group.
    pub start: usize,
    /// Number of units in the group.
    pub len: usize,
    /// Cumulative duration of the group in seconds.
    pub duration: f64,
}

impl SegmentSpan {
    /// The unit-index range this span covers.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Groups consecutive units into high-level segments.
///
/// Units are accumulated greedily until the group exceeds
/// [`SEGMENT_FLOOR_SECS`] *and* holds more than one unit (a single-point
/// descriptor set degenerates under index construction). A trailing remainder
/// that never crosses the floor is merged into the previous group, after its
/// units, preserving temporal order. If only one group ever forms it is
/// emitted regardless of length.
pub fn group_by_duration(durations: &[f64]) -> Vec<SegmentSpan> {
    let mut groups: Vec<SegmentSpan> = Vec::new();
    let mut start = 0;
    let mut acc = 0.0;

    for (i, d) in durations.iter().enumerate() {
        acc += d;
        let len = i + 1 - start;
        if acc > SEGMENT_FLOOR_SECS && len > 1 {
            debug!(start, len, duration = acc, "emitting high-level group");
            groups.push(SegmentSpan {
                start,
                len,
                duration: acc,
            });
            start = i + 1;
            acc = 0.0;
        }
    }

    let remainder = durations.len() - start;
    if remainder > 0 {
        if let Some(last) = groups.last_mut() {
            debug!(
                remainder,
                duration = acc,
                "merging trailing remainder into previous group"
            );
            last.len += remainder;
            last.duration += acc;
        } else {
            warn!(
                duration = acc,
                "only one high-level group formed, emitting it regardless"
            );
            groups.push(SegmentSpan {
                start: 0,
                len: remainder,
                duration: acc,
            });
        }
    }
    groups
}

/// Fixed-length segmenter: slices audio into `chop`-ms units, dropping the
/// short tail.
#[derive(Debug, Clone, Copy)]
pub struct FixedChop {
    chop_ms: u32,
}

impl FixedChop {
    /// Creates a segmenter with the given unit size in milliseconds.
    pub fn new(chop_ms: u32) -> Self {
        Self { chop_ms }
    }
}

impl Segmenter for FixedChop {
    fn segment(
        &self,
        samples: &[f64],
        sample_rate: u32,
    ) -> Result<Vec<Range<usize>>, CollabError> {
        let unit_len = secs_to_samps(self.chop_ms as f64 / 1000.0, sample_rate);
        if unit_len == 0 {
            return Err(CollabError::new(format!(
                "chop of {} ms yields empty units at {} Hz",
                self.chop_ms, sample_rate
            )));
        }
        let mut spans = Vec::new();
        let mut begin = 0;
        while begin + unit_len <= samples.len() {
            spans.push(begin..begin + unit_len);
            begin += unit_len;
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_exceed_floor_and_unit_count() {
        // 2s units: groups close at 6s / 3 units.
        let durations = vec![2.0; 9];
        let groups = group_by_duration(&durations);
        assert_eq!(groups.len(), 3);
        for g in &groups {
            assert!(g.duration > SEGMENT_FLOOR_SECS);
            assert!(g.len > 1);
        }
        assert_eq!(groups[0].range(), 0..3);
        assert_eq!(groups[2].range(), 6..9);
    }

    #[test]
    fn single_long_unit_does_not_close_a_group() {
        // A 6s unit alone exceeds the floor but a one-unit group is
        // degenerate; the group keeps accumulating.
        let durations = vec![6.0, 1.0];
        let groups = group_by_duration(&durations);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len, 2);
    }

    #[test]
    fn trailing_remainder_merges_into_previous_group() {
        // Two full groups of 3, then a 2-unit remainder totalling 4s.
        let durations = vec![2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let groups = group_by_duration(&durations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].range(), 3..8);
        assert!((groups[1].duration - 10.0).abs() < 1e-12);
    }

    #[test]
    fn lone_underfloor_group_is_emitted() {
        let durations = vec![1.0, 1.0];
        let groups = group_by_duration(&durations);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len, 2);
        assert!(groups[0].duration < SEGMENT_FLOOR_SECS);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert_eq!(group_by_duration(&[]), Vec::<SegmentSpan>::new());
    }

    #[test]
    fn fixed_chop_drops_the_short_tail() {
        let chop = FixedChop::new(500);
        let samples = vec![0.0; 44100 + 10]; // 1.0s and a bit at 44.1 kHz
        let spans = chop.segment(&samples, 44100).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], 0..22050);
        assert_eq!(spans[1], 22050..44100);
    }

    #[test]
    fn fixed_chop_rejects_degenerate_units() {
        let chop = FixedChop::new(0);
        assert!(chop.segment(&[0.0; 100], 44100).is_err());
    }
}
