//! Subprocess collaborators for analysis, time-stretching, and onset
//! segmentation.
//!
//! The engine stays agnostic of how features are computed; these adapters
//! shell out to external tools, exchanging audio through temporary files.

use std::fs;
use std::ops::Range;
use std::process::{Command, Output};

use mosaicade_descriptor::FeatureVector;
use mosaicade_engine::time::secs_to_samps;
use mosaicade_engine::{AudioIo, CollabError, FeatureExtractor, Segmenter, TimeStretch};
use tracing::debug;

use crate::descriptors::vector_from_json;
use crate::wave::HoundIo;

/// Default time-stretch program.
pub const DEFAULT_STRETCH_PROGRAM: &str = "rubberband";

/// Default onset-detection program.
pub const DEFAULT_ONSET_PROGRAM: &str = "aubioonset";

fn run_command(mut command: Command) -> Result<Output, CollabError> {
    debug!(?command, "running collaborator command");
    let output = command.output().map_err(|e| {
        CollabError::new(format!("cannot run {:?}: {e}", command.get_program()))
    })?;
    if !output.status.success() {
        return Err(CollabError::new(format!(
            "{:?} failed with {}: {}",
            command.get_program(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output)
}

/// Feature extraction via an external analyzer.
///
/// The program is invoked as `<program> <in.wav> <out.json>` and must write
/// a JSON descriptor tree to the second argument.
pub struct CommandExtractor {
    program: String,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FeatureExtractor for CommandExtractor {
    fn analyze(&self, samples: &[f64], sample_rate: u32) -> Result<FeatureVector, CollabError> {
        let dir = tempfile::tempdir()
            .map_err(|e| CollabError::new(format!("cannot create temp dir: {e}")))?;
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.json");
        HoundIo.write(samples, &input, sample_rate)?;

        let mut command = Command::new(&self.program);
        command.arg(&input).arg(&output);
        run_command(command)?;

        let text = fs::read_to_string(&output)
            .map_err(|e| CollabError::new(format!("analyzer wrote no output: {e}")))?;
        let value = serde_json::from_str(&text)
            .map_err(|e| CollabError::new(format!("analyzer output is not JSON: {e}")))?;
        Ok(vector_from_json(&value))
    }
}

/// Time-stretching via an external program, `rubberband` by default.
///
/// Invoked as `<program> -D <secs> <in.wav> <out.wav>`.
pub struct CommandStretch {
    program: String,
}

impl CommandStretch {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandStretch {
    fn default() -> Self {
        Self::new(DEFAULT_STRETCH_PROGRAM)
    }
}

impl TimeStretch for CommandStretch {
    fn stretch(
        &self,
        samples: &[f64],
        sample_rate: u32,
        target_secs: f64,
    ) -> Result<Vec<f64>, CollabError> {
        if target_secs <= 0.0 {
            return Err(CollabError::new(format!(
                "cannot stretch to {target_secs} seconds"
            )));
        }
        let dir = tempfile::tempdir()
            .map_err(|e| CollabError::new(format!("cannot create temp dir: {e}")))?;
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        HoundIo.write(samples, &input, sample_rate)?;

        let mut command = Command::new(&self.program);
        command
            .arg("-D")
            .arg(target_secs.to_string())
            .arg(&input)
            .arg(&output);
        run_command(command)?;

        let (stretched, _) = HoundIo.read(&output)?;
        Ok(stretched)
    }
}

/// Onset detection via an external program, `aubioonset` by default.
///
/// Invoked as `<program> -i <in.wav>`; stdout must carry one onset time in
/// seconds per line.
pub struct CommandSegmenter {
    program: String,
}

impl CommandSegmenter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_ONSET_PROGRAM)
    }
}

impl Segmenter for CommandSegmenter {
    fn segment(
        &self,
        samples: &[f64],
        sample_rate: u32,
    ) -> Result<Vec<Range<usize>>, CollabError> {
        let dir = tempfile::tempdir()
            .map_err(|e| CollabError::new(format!("cannot create temp dir: {e}")))?;
        let input = dir.path().join("in.wav");
        HoundIo.write(samples, &input, sample_rate)?;

        let mut command = Command::new(&self.program);
        command.arg("-i").arg(&input);
        let output = run_command(command)?;

        let onsets = parse_onsets(&String::from_utf8_lossy(&output.stdout))?;
        Ok(onset_ranges(&onsets, samples.len(), sample_rate))
    }
}

/// Parses one onset time in seconds per line.
pub fn parse_onsets(stdout: &str) -> Result<Vec<f64>, CollabError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>()
                .map_err(|e| CollabError::new(format!("bad onset time '{line}': {e}")))
        })
        .collect()
}

/// Converts onset times into contiguous sample ranges covering `total`
/// samples. Onsets at or past the end and regressions are dropped.
pub fn onset_ranges(onsets: &[f64], total: usize, sample_rate: u32) -> Vec<Range<usize>> {
    let mut bounds = vec![0usize];
    for &secs in onsets {
        let sample = secs_to_samps(secs, sample_rate);
        if sample > *bounds.last().unwrap_or(&0) && sample < total {
            bounds.push(sample);
        }
    }
    bounds.push(total);
    bounds
        .windows(2)
        .filter(|pair| pair[1] > pair[0])
        .map(|pair| pair[0]..pair[1])
        .collect()
}
