//! Descriptor spaces, feature vectors, and unit references.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptors that are stripped before any distance computation.
///
/// These are variable-length sequences (onset positions, beat grids) whose
/// arity depends on the analyzed audio rather than on the extractor
/// configuration, so they can never participate in a stable metric.
pub const EXCLUDED_DESCRIPTORS: &[&str] = &[
    "rhythm.beats_position",
    "rhythm.bpm_estimates",
    "rhythm.bpm_intervals",
    "rhythm.onset_times",
    "rhythm.rubato_start",
    "rhythm.rubato_stop",
];

/// Reference to a unit or segment in a corpus or index.
///
/// Unit names are zero-padded ordinal stems (`0000012`), optionally prefixed
/// by a path-like qualifier (`drums/0000012`). The ordinal encodes temporal
/// position within the segmented audio and is load-bearing: iteration in
/// ascending `UnitId` order is the only mechanism that establishes sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Creates a unit reference from an arbitrary name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a unit reference from a temporal ordinal, zero-padded to the
    /// standard seven digits.
    pub fn from_ordinal(ordinal: u32) -> Self {
        Self(format!("{ordinal:07}"))
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the temporal ordinal out of the reference, if present.
    ///
    /// The ordinal is the trailing run of ASCII digits in the last path
    /// component, after stripping any extension.
    pub fn ordinal(&self) -> Option<u32> {
        let stem = self.0.rsplit('/').next().unwrap_or(&self.0);
        let stem = stem.split('.').next().unwrap_or(stem);
        let digits: String = stem
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for UnitId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A named point in a descriptor space.
///
/// Each descriptor holds one or more scalar values; a single-element slice is
/// a scalar descriptor. Ordering is deterministic (sorted by name).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, Vec<f64>>,
}

impl FeatureVector {
    /// Creates an empty feature vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a descriptor with the given values.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.values.insert(name.into(), values);
    }

    /// Inserts (or replaces) a scalar descriptor.
    pub fn insert_scalar(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), vec![value]);
    }

    /// Returns the values for a descriptor.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Returns the first value of a descriptor, for scalar descriptors.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|v| v.first().copied())
    }

    /// Removes a descriptor, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    /// Removes every descriptor named in `names`.
    pub fn drop_descriptors(&mut self, names: &[String]) {
        for name in names {
            self.values.remove(name);
        }
    }

    /// Strips the fixed excluded-descriptor set. Always applied before a
    /// vector participates in distance computation.
    pub fn strip_excluded(&mut self) {
        for name in EXCLUDED_DESCRIPTORS {
            self.values.remove(*name);
        }
    }

    /// Consuming variant of [`strip_excluded`](Self::strip_excluded).
    pub fn stripped(mut self) -> Self {
        self.strip_excluded();
        self
    }

    /// Iterates over `(name, values)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterates over descriptor names in name order.
    pub fn descriptor_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the layout of this vector.
    pub fn space(&self) -> DescriptorSpace {
        let mut space = DescriptorSpace::default();
        for (name, values) in &self.values {
            space.insert(name.clone(), values.len());
        }
        space
    }

    /// Number of descriptors held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The named layout of a descriptor space: descriptor name to arity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorSpace {
    dims: BTreeMap<String, usize>,
}

impl DescriptorSpace {
    /// Creates an empty space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor with the given arity.
    pub fn insert(&mut self, name: impl Into<String>, arity: usize) {
        self.dims.insert(name.into(), arity);
    }

    /// Whether the space contains a descriptor.
    pub fn contains(&self, name: &str) -> bool {
        self.dims.contains_key(name)
    }

    /// Removes a descriptor from the layout.
    pub fn remove(&mut self, name: &str) -> bool {
        self.dims.remove(name).is_some()
    }

    /// Iterates over descriptor names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dims.keys().map(String::as_str)
    }

    /// Returns the names present in `self` but absent from `other`.
    ///
    /// This is the primitive behind descriptor-layout reconciliation: each
    /// side removes its own difference so both end up identical.
    pub fn difference(&self, other: &DescriptorSpace) -> Vec<String> {
        self.dims
            .keys()
            .filter(|name| !other.contains(name))
            .cloned()
            .collect()
    }

    /// Extends this layout with every descriptor of `other`.
    pub fn merge(&mut self, other: &DescriptorSpace) {
        for (name, arity) in &other.dims {
            self.dims.entry(name.clone()).or_insert(*arity);
        }
    }

    /// Number of descriptors in the layout.
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordinal_parses_padded_stem() {
        assert_eq!(UnitId::from_ordinal(12).as_str(), "0000012");
        assert_eq!(UnitId::from_ordinal(12).ordinal(), Some(12));
        assert_eq!(UnitId::new("drums/0000003").ordinal(), Some(3));
        assert_eq!(UnitId::new("0000040.json").ordinal(), Some(40));
        assert_eq!(UnitId::new("no-digits").ordinal(), None);
    }

    #[test]
    fn unit_ids_order_by_ordinal_when_padded() {
        let mut ids = vec![
            UnitId::from_ordinal(10),
            UnitId::from_ordinal(2),
            UnitId::from_ordinal(1),
        ];
        ids.sort();
        let ordinals: Vec<_> = ids.iter().filter_map(UnitId::ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 10]);
    }

    #[test]
    fn strip_excluded_removes_only_the_fixed_set() {
        let mut v = FeatureVector::new();
        v.insert_scalar("rhythm.bpm", 120.0);
        v.insert("rhythm.onset_times", vec![0.1, 0.5, 0.9]);
        v.insert("rhythm.beats_position", vec![0.2, 0.6]);
        v.strip_excluded();
        assert_eq!(v.len(), 1);
        assert_eq!(v.scalar("rhythm.bpm"), Some(120.0));
    }

    #[test]
    fn space_difference_is_one_sided() {
        let mut a = FeatureVector::new();
        a.insert_scalar("pitch.mean", 1.0);
        a.insert_scalar("shared", 2.0);
        let mut b = FeatureVector::new();
        b.insert_scalar("spectral_energy.mean", 3.0);
        b.insert_scalar("shared", 4.0);

        let sa = a.space();
        let sb = b.space();
        assert_eq!(sa.difference(&sb), vec!["pitch.mean".to_string()]);
        assert_eq!(sb.difference(&sa), vec!["spectral_energy.mean".to_string()]);
    }

    #[test]
    fn space_tracks_arity() {
        let mut v = FeatureVector::new();
        v.insert("mfcc.mean", vec![1.0, 2.0, 3.0]);
        let space = v.space();
        assert!(space.contains("mfcc.mean"));
        assert_eq!(space.len(), 1);
    }
}
