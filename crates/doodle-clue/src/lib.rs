//! Clues and guesses.
//!
//! - [`ClueCorpus`] - the read-only category → words table for one locale.
//! - [`ClueSource`] - draws clues from a corpus while avoiding recent words
//!   and back-to-back categories. One per room.
//! - [`GuessScorer`] - exact (normalized) match and fuzzy similarity.

mod corpus;
mod error;
mod scorer;
mod source;

pub use corpus::ClueCorpus;
pub use error::ClueError;
pub use scorer::{normalize, ratio, GuessScorer, Score, DEFAULT_CLOSE_THRESHOLD};
pub use source::ClueSource;
