//! Error types for corpus loading.

use std::path::PathBuf;

/// Errors that can occur while loading a clue corpus.
#[derive(Debug, thiserror::Error)]
pub enum ClueError {
    /// The corpus file could not be read.
    #[error("cannot read clue corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The corpus is not a JSON object of string arrays.
    #[error("malformed clue corpus: {0}")]
    Parse(#[from] serde_json::Error),

    /// The corpus has no categories.
    #[error("clue corpus is empty")]
    Empty,

    /// A category has no words; drawing from it could never succeed.
    #[error("category {0:?} has no words")]
    EmptyCategory(String),
}
