//! Error types for the search contracts.

use thiserror::Error;

/// Errors a similarity-search collaborator can signal.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The index holds no entries.
    #[error("similarity index is empty")]
    EmptyIndex,

    /// The query point shares no descriptors with the index layout, so every
    /// distance would be vacuous.
    #[error("query point shares no descriptors with the index layout")]
    DisjointLayout,

    /// Engine-specific failure.
    #[error("search engine error: {message}")]
    Engine {
        /// Error message.
        message: String,
    },
}

impl SearchError {
    /// Creates an engine-specific error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Returns the stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::EmptyIndex => "SEARCH_001",
            SearchError::DisjointLayout => "SEARCH_002",
            SearchError::Engine { .. } => "SEARCH_003",
        }
    }
}
