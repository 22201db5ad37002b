//! Well-known descriptor names.
//!
//! These are the dotted keys the feature extractor emits for a standard
//! configuration. The engine only ever treats them as opaque strings; they are
//! collected here so metric defaults and callers agree on spelling.

/// Happy-mood classifier output.
pub const MOOD_HAPPY: &str = "highlevel.mood_happy.all.happy";
/// Sad-mood classifier output.
pub const MOOD_SAD: &str = "highlevel.mood_sad.all.sad";
/// Relaxed-mood classifier output.
pub const MOOD_RELAXED: &str = "highlevel.mood_relaxed.all.relaxed";
/// Aggressive-mood classifier output.
pub const MOOD_AGGRESSIVE: &str = "highlevel.mood_aggressive.all.aggressive";

/// Estimated tempo of the analyzed audio, in beats per minute.
pub const BPM: &str = "rhythm.bpm";
/// Duration of the analyzed audio, in seconds.
pub const LENGTH: &str = "metadata.audio_properties.length";
/// Mean fundamental pitch.
pub const PITCH_MEAN: &str = "pitch.mean";
/// Mean spectral energy.
pub const SPECTRAL_ENERGY_MEAN: &str = "spectral_energy.mean";
