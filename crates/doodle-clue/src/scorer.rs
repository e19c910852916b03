//! Guess scoring: normalized exact match, then fuzzy similarity.

/// Similarity above which a wrong guess counts as close.
pub const DEFAULT_CLOSE_THRESHOLD: u8 = 60;

/// The outcome of scoring one guess against one clue word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Equal after normalization.
    Exact,
    /// Not equal, but the similarity ratio exceeds the threshold.
    Close(u8),
    /// Neither.
    Miss(u8),
}

/// Scores guesses against a clue word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessScorer {
    close_threshold: u8,
}

impl Default for GuessScorer {
    fn default() -> Self {
        Self::new(DEFAULT_CLOSE_THRESHOLD)
    }
}

impl GuessScorer {
    /// `close_threshold` is clamped to 0–100.
    pub fn new(close_threshold: u8) -> Self {
        Self {
            close_threshold: close_threshold.min(100),
        }
    }

    pub fn close_threshold(&self) -> u8 {
        self.close_threshold
    }

    /// Exact match is decided on normalized text; the similarity ratio is
    /// computed on the raw strings.
    pub fn score(&self, guess: &str, word: &str) -> Score {
        if normalize(guess) == normalize(word) {
            return Score::Exact;
        }
        let similarity = ratio(guess, word);
        if similarity > self.close_threshold {
            Score::Close(similarity)
        } else {
            Score::Miss(similarity)
        }
    }
}

/// Lower-cases, strips commas and periods, and trims surrounding
/// whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| *c != ',' && *c != '.')
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Similarity of two strings as an integer 0–100.
///
/// `2 * LCS / (len(a) + len(b))`, rounded, where LCS is the length of the
/// longest common subsequence of Unicode scalar values. Two empty strings
/// are identical (100); one empty string matches nothing (0).
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Single-row LCS table.
    let mut row = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    let lcs = row[b.len()];

    // round(200 * lcs / total) in integers.
    let scaled = (400 * lcs + total) / (2 * total);
    scaled.min(100) as u8
}
