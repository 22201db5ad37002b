//! Run reports written next to persisted mosaics.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mosaicade_engine::SessionConfig;
use serde::{Deserialize, Serialize};

/// Summary of one mosaicing run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    /// Path of the target recording.
    pub target: String,
    /// Path of the persisted mosaic.
    pub output: String,
    /// Segmentation scheme the run used.
    pub chop: String,
    /// Number of units in the assembled mosaic.
    pub units: usize,
    /// Duration of the assembled signal in seconds.
    pub duration_secs: f64,
    /// Sample rate of the output in Hz.
    pub sample_rate: u32,
    /// The full session configuration, for reproducibility.
    pub config: SessionConfig,
}

impl RunReport {
    /// Where the report for a given output file lives.
    pub fn path_for(output: &Path) -> PathBuf {
        output.with_extension("report.json")
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_path_sits_next_to_the_output() {
        assert_eq!(
            RunReport::path_for(Path::new("/tmp/out.wav")),
            PathBuf::from("/tmp/out.report.json")
        );
    }

    #[test]
    fn report_roundtrips_through_json() {
        let report = RunReport {
            target: "target.wav".into(),
            output: "out.wav".into(),
            chop: "500".into(),
            units: 12,
            duration_secs: 6.0,
            sample_rate: 44100,
            config: SessionConfig::default(),
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.units, 12);
        assert_eq!(back.config, report.config);
    }
}
