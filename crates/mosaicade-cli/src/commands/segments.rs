//! Segments command: print the high-level grouping a target would get.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use mosaicade_engine::{group_by_duration, AudioIo, FixedChop, Mosaic, Segmenter, Unit};

use crate::tools::CommandSegmenter;
use crate::wave::HoundIo;

/// Segments the target, groups the resulting units, and prints the spans.
///
/// Each printed duration comes from the actual audio of the group, taken
/// as a sub-mosaic of the chopped target.
pub fn run(target: &str, chop_ms: Option<u32>, onset_program: &str) -> Result<ExitCode> {
    let (samples, sample_rate) = HoundIo
        .read(Path::new(target))
        .with_context(|| format!("cannot read target {target}"))?;

    let spans = match chop_ms {
        Some(ms) => FixedChop::new(ms).segment(&samples, sample_rate)?,
        None => CommandSegmenter::new(onset_program).segment(&samples, sample_rate)?,
    };
    let mosaic = Mosaic::from_units(
        spans
            .iter()
            .map(|span| Unit::real(samples[span.clone()].to_vec(), sample_rate))
            .collect(),
    );
    let durations: Vec<f64> = mosaic.units().iter().map(Unit::duration).collect();
    let groups = group_by_duration(&durations);

    println!(
        "{}: {} units, {} segments",
        target.bold(),
        durations.len(),
        groups.len()
    );
    for (index, group) in groups.iter().enumerate() {
        let sub = mosaic.submosaic(group.start, group.len);
        println!(
            "  {} units {}..{} ({:.2}s)",
            format!("segment {index}").cyan(),
            group.start,
            group.start + group.len,
            sub.duration()
        );
    }
    Ok(ExitCode::SUCCESS)
}
