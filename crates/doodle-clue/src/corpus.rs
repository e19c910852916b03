//! The static clue table for one locale.

use std::collections::BTreeMap;
use std::path::Path;

use crate::ClueError;

/// A read-only mapping from category name to candidate words.
///
/// Loaded once at startup and shared (behind an `Arc`) by every room of
/// the locale. Categories are kept in sorted order so a seeded draw is
/// reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueCorpus {
    categories: Vec<(String, Vec<String>)>,
}

impl ClueCorpus {
    /// Builds a corpus from `(category, words)` pairs.
    ///
    /// Rejects an empty corpus and empty categories. Duplicate category
    /// names are merged.
    pub fn new<I, C, W>(entries: I) -> Result<Self, ClueError>
    where
        I: IntoIterator<Item = (C, Vec<W>)>,
        C: Into<String>,
        W: Into<String>,
    {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (category, words) in entries {
            map.entry(category.into())
                .or_default()
                .extend(words.into_iter().map(Into::into));
        }
        if map.is_empty() {
            return Err(ClueError::Empty);
        }
        if let Some((name, _)) = map.iter().find(|(_, words)| words.is_empty()) {
            return Err(ClueError::EmptyCategory(name.clone()));
        }
        Ok(Self {
            categories: map.into_iter().collect(),
        })
    }

    /// Parses `{"category": ["word", ...], ...}`.
    pub fn from_json(text: &str) -> Result<Self, ClueError> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(text)?;
        Self::new(map)
    }

    /// Loads `<dir>/<locale>.json`.
    pub fn load(dir: impl AsRef<Path>, locale: &str) -> Result<Self, ClueError> {
        let path = dir.as_ref().join(format!("{locale}.json"));
        let text = std::fs::read_to_string(&path).map_err(|source| ClueError::Io {
            path: path.clone(),
            source,
        })?;
        let corpus = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            categories = corpus.category_count(),
            words = corpus.word_count(),
            "clue corpus loaded"
        );
        Ok(corpus)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn word_count(&self) -> usize {
        self.categories.iter().map(|(_, words)| words.len()).sum()
    }

    /// The `index`-th category and its words, in sorted order.
    pub(crate) fn category(&self, index: usize) -> Option<(&str, &[String])> {
        self.categories
            .get(index)
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }

    /// Iterates categories in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, words)| (name.as_str(), words.as_slice()))
    }
}
