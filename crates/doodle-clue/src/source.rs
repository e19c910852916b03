//! Anti-repeat clue drawing.

use std::sync::Arc;

use doodle_protocol::Clue;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ClueCorpus;

/// History length at which old words are dropped.
const HISTORY_LIMIT: usize = 95;
/// Words kept after the history is trimmed.
const HISTORY_KEEP: usize = 5;
/// Draws that must satisfy both the word and the category rule.
const STRICT_ATTEMPTS: u32 = 32;
/// Further draws that only have to avoid recent words.
const RELAXED_ATTEMPTS: u32 = 32;

/// Draws clues for one room.
///
/// A draw picks a category uniformly, then a word uniformly within it. It
/// is rejected if the word was used recently or the category repeats the
/// previous one. Small corpora cannot always satisfy both rules, so the
/// category rule is dropped after [`STRICT_ATTEMPTS`] rejections and the
/// word rule after a further [`RELAXED_ATTEMPTS`]; a draw always returns.
pub struct ClueSource<R = StdRng> {
    corpus: Arc<ClueCorpus>,
    history: Vec<String>,
    last_category: Option<String>,
    rng: R,
}

impl ClueSource<StdRng> {
    /// A source seeded from the operating system.
    pub fn new(corpus: Arc<ClueCorpus>) -> Self {
        Self::with_rng(corpus, StdRng::from_os_rng())
    }

    /// A reproducible source.
    pub fn seeded(corpus: Arc<ClueCorpus>, seed: u64) -> Self {
        Self::with_rng(corpus, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ClueSource<R> {
    pub fn with_rng(corpus: Arc<ClueCorpus>, rng: R) -> Self {
        Self {
            corpus,
            history: Vec::new(),
            last_category: None,
            rng,
        }
    }

    /// Draws the next clue and records it in the history.
    pub fn next_clue(&mut self) -> Clue {
        let clue = self.draw_with_fallback();
        self.remember(&clue);
        clue
    }

    /// Recently used words, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn last_category(&self) -> Option<&str> {
        self.last_category.as_deref()
    }

    fn draw_with_fallback(&mut self) -> Clue {
        for _ in 0..STRICT_ATTEMPTS {
            let clue = self.draw();
            if !self.is_recent(&clue) && !self.repeats_category(&clue) {
                return clue;
            }
        }
        for _ in 0..RELAXED_ATTEMPTS {
            let clue = self.draw();
            if !self.is_recent(&clue) {
                tracing::debug!(
                    category = %clue.category,
                    "clue draw allowed a repeated category"
                );
                return clue;
            }
        }
        let clue = self.draw();
        tracing::warn!(
            categories = self.corpus.category_count(),
            words = self.corpus.word_count(),
            "clue corpus too small to avoid repeats"
        );
        clue
    }

    fn draw(&mut self) -> Clue {
        let index = self.rng.random_range(0..self.corpus.category_count());
        // The corpus constructor rejects empty corpora and empty categories.
        match self.corpus.category(index) {
            Some((category, words)) if !words.is_empty() => {
                let word = &words[self.rng.random_range(0..words.len())];
                Clue::new(category, word.as_str())
            }
            _ => Clue::new("", ""),
        }
    }

    fn is_recent(&self, clue: &Clue) -> bool {
        self.history.iter().any(|w| *w == clue.word)
    }

    fn repeats_category(&self, clue: &Clue) -> bool {
        self.last_category.as_deref() == Some(clue.category.as_str())
    }

    fn remember(&mut self, clue: &Clue) {
        self.history.push(clue.word.clone());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_KEEP;
            self.history.drain(..excess);
        }
        self.last_category = Some(clue.category.clone());
    }
}
