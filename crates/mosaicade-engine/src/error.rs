//! Error taxonomy for the mosaicing engine.
//!
//! Only session-setup failures abort a run. Everything that can go wrong at
//! the level of a single unit (missing analysis, a collaborator error, a
//! malformed search hit) is logged and the unit is skipped or replaced by
//! silence instead.

use mosaicade_descriptor::{SearchError, UnitId};
use thiserror::Error;

use crate::collab::CollabError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during a mosaicing run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Descriptor file absent for a unit; treated as silence, not fatal.
    #[error("no analysis available for unit {unit}")]
    MissingAnalysis {
        /// The unit with no descriptor vector.
        unit: UnitId,
    },

    /// No index exists for the requested chop; triggers on-demand rebuild.
    #[error("no index available for chop '{chop}'")]
    MissingIndex {
        /// The requested segmentation scheme.
        chop: String,
    },

    /// Source and target descriptor layouts differ; reconciled by mutual
    /// removal, logged, not fatal.
    #[error("descriptor layouts differ: source-only {source_only:?}, target-only {target_only:?}")]
    DescriptorMismatch {
        /// Descriptors present only on the source side.
        source_only: Vec<String>,
        /// Descriptors present only on the target side.
        target_only: Vec<String>,
    },

    /// Session setup failure (no target set, no corpus selected). Fatal for
    /// the current operation.
    #[error("session setup error: {message}")]
    Setup {
        /// What was missing or inconsistent.
        message: String,
    },

    /// A collaborator (extractor, search, stretch, audio I/O) signalled an
    /// error.
    #[error(transparent)]
    Collaborator(#[from] CollabError),

    /// The similarity-search collaborator signalled an error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a setup error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    /// Creates a missing-index error for a chop.
    pub fn missing_index(chop: impl Into<String>) -> Self {
        Self::MissingIndex { chop: chop.into() }
    }

    /// Returns the stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::MissingAnalysis { .. } => "MOS_001",
            EngineError::MissingIndex { .. } => "MOS_002",
            EngineError::DescriptorMismatch { .. } => "MOS_003",
            EngineError::Setup { .. } => "MOS_004",
            EngineError::Collaborator(_) => "MOS_005",
            EngineError::Search(_) => "MOS_006",
            EngineError::Io(_) => "MOS_007",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_helper_carries_message() {
        let err = EngineError::setup("target has not been set");
        assert!(err.to_string().contains("target has not been set"));
        assert_eq!(err.code(), "MOS_004");
    }

    #[test]
    fn collaborator_errors_convert() {
        let err: EngineError = CollabError::new("extractor crashed").into();
        assert_eq!(err.code(), "MOS_005");
        assert!(err.to_string().contains("extractor crashed"));
    }
}
