//! Filesystem source corpus.
//!
//! One directory per segmentation scheme under the corpus root, with
//! zero-padded-ordinal WAV files and sibling descriptor files:
//!
//! ```text
//! corpus/
//!   500/                  # fixed 500 ms units
//!     0000000.wav
//!     0000000.json
//!     0000001.wav
//!     0000001.json
//!   onsets/
//!     ...
//!   highlevel_500/        # precomputed high-level grouping
//!     0000000.json        # {"vector": {...}, "members": ["0000000", ...]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use mosaicade_descriptor::{names, UnitId};
use mosaicade_engine::{AudioIo, Chop, CollabError, Corpus, SourceSegment, SourceUnit};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::descriptors::vector_from_json;
use crate::wave::HoundIo;

/// A corpus rooted at a directory, pinned to one segmentation scheme.
pub struct FsCorpus {
    root: PathBuf,
    chop: Chop,
}

/// On-disk shape of one high-level segment file.
#[derive(Deserialize)]
struct SegmentFile {
    #[serde(default)]
    vector: serde_json::Value,
    members: Vec<String>,
}

impl FsCorpus {
    /// Opens the corpus at `root` for the given chop.
    pub fn open(root: impl Into<PathBuf>, chop: Chop) -> Self {
        Self {
            root: root.into(),
            chop,
        }
    }

    fn units_dir(&self) -> PathBuf {
        self.root.join(self.chop.to_string())
    }

    fn highlevel_dir(&self) -> PathBuf {
        self.root.join(format!("highlevel_{}", self.chop))
    }

    /// Lists the ordinal-named descriptor files directly under `dir`,
    /// ascending by ordinal.
    fn descriptor_files(dir: &Path) -> Vec<(u32, PathBuf)> {
        let mut files: Vec<(u32, PathBuf)> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.into_path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?;
                let ordinal = UnitId::new(stem).ordinal()?;
                Some((ordinal, path))
            })
            .collect();
        files.sort_by_key(|(ordinal, _)| *ordinal);
        files
    }

    fn load_json(path: &Path) -> Result<serde_json::Value, CollabError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CollabError::new(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| CollabError::new(format!("malformed {}: {e}", path.display())))
    }
}

impl Corpus for FsCorpus {
    fn units(&self, chop: &Chop) -> Result<Vec<SourceUnit>, CollabError> {
        if *chop != self.chop {
            warn!(requested = %chop, pinned = %self.chop, "corpus opened for a different chop");
        }
        let dir = self.units_dir();
        if !dir.is_dir() {
            return Err(CollabError::new(format!(
                "no corpus directory for chop '{}' at {}",
                self.chop,
                dir.display()
            )));
        }

        let mut units = Vec::new();
        for (ordinal, path) in Self::descriptor_files(&dir) {
            let vector = vector_from_json(&Self::load_json(&path)?);
            let id = UnitId::from_ordinal(ordinal);
            let duration = match vector.scalar(names::LENGTH) {
                Some(secs) => secs,
                None => {
                    warn!(unit = %id, "descriptor file lacks a length, probing the wav");
                    let (samples, rate) = self.audio(&id)?;
                    samples.len() as f64 / f64::from(rate)
                }
            };
            units.push(SourceUnit {
                id,
                duration,
                vector,
            });
        }
        debug!(count = units.len(), dir = %dir.display(), "scanned corpus units");
        Ok(units)
    }

    fn high_level(&self, _chop: &Chop) -> Result<Option<Vec<SourceSegment>>, CollabError> {
        let dir = self.highlevel_dir();
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut segments = Vec::new();
        for (ordinal, path) in Self::descriptor_files(&dir) {
            let file: SegmentFile = serde_json::from_value(Self::load_json(&path)?)
                .map_err(|e| CollabError::new(format!("malformed {}: {e}", path.display())))?;
            segments.push(SourceSegment {
                id: UnitId::from_ordinal(ordinal),
                vector: vector_from_json(&file.vector),
                members: file.members.into_iter().map(UnitId::from).collect(),
            });
        }
        debug!(count = segments.len(), "loaded high-level grouping");
        Ok(Some(segments))
    }

    fn audio(&self, id: &UnitId) -> Result<(Vec<f64>, u32), CollabError> {
        let path = self.units_dir().join(format!("{id}.wav"));
        HoundIo.read(&path)
    }
}
