//! Create command: run a full mosaicing session.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use mosaicade_engine::{AudioIo, Selector, SessionConfig};
use mosaicade_index::LinearSearchEngine;
use tracing::info;

use crate::corpus::FsCorpus;
use crate::report::RunReport;
use crate::tools::{CommandExtractor, CommandSegmenter, CommandStretch};
use crate::wave::HoundIo;

/// Runs a mosaicing session: segment and analyze the target, select source
/// units, assemble, normalise, persist, and write a run report.
#[allow(clippy::too_many_arguments)]
pub fn run(
    target: &str,
    corpus_root: &str,
    output: &str,
    config_path: Option<&str>,
    extractor_program: &str,
    stretch_program: &str,
    onset_program: &str,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    info!(target, corpus = corpus_root, chop = %config.chop, "starting mosaicing session");

    let (samples, sample_rate) = HoundIo
        .read(Path::new(target))
        .with_context(|| format!("cannot read target {target}"))?;

    let corpus = FsCorpus::open(corpus_root, config.chop.clone());
    let engine = LinearSearchEngine;
    let extractor = CommandExtractor::new(extractor_program);
    let stretcher = CommandStretch::new(stretch_program);
    let segmenter = CommandSegmenter::new(onset_program);

    let mut selector = Selector::new(config.clone(), &engine, &extractor, &stretcher, &corpus)
        .with_onset_segmenter(&segmenter);
    selector.set_target(samples, sample_rate)?;
    selector.process_target()?;
    let mut mosaic = selector.create_mosaic()?;
    mosaic.normalise(0.99);

    let out = Path::new(output);
    mosaic.persist(&HoundIo, out)?;

    let report = RunReport {
        target: target.to_string(),
        output: output.to_string(),
        chop: config.chop.to_string(),
        units: mosaic.len(),
        duration_secs: mosaic.duration(),
        sample_rate: mosaic.sample_rate(),
        config,
    };
    let report_path = RunReport::path_for(out);
    report.write(&report_path)?;

    println!(
        "{} {} ({} units, {:.2}s)",
        "wrote".green().bold(),
        output,
        mosaic.len(),
        mosaic.duration()
    );
    println!("report: {}", report_path.display());
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&str>) -> Result<SessionConfig> {
    match path {
        Some(p) => {
            let text =
                fs::read_to_string(p).with_context(|| format!("cannot read session config {p}"))?;
            serde_json::from_str(&text).with_context(|| format!("malformed session config {p}"))
        }
        None => Ok(SessionConfig::default()),
    }
}
