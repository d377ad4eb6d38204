//! The `WordSource` trait and its two implementations.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::WordsError;

/// One challenge word with its accepted translations.
///
/// Translations are normalized (trimmed, lowercased) when the challenge
/// is built; [`Challenge::accepts`] applies the same normalization to the
/// answer, so players are not scored on case or stray whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub word: String,
    pub translations: Vec<String>,
}

impl Challenge {
    /// Builds a challenge, normalizing every translation.
    pub fn new(word: &str, translations: &[&str]) -> Self {
        Self {
            word: word.trim().to_string(),
            translations: translations.iter().map(|t| normalize(t)).collect(),
        }
    }

    /// `true` if `answer` is one of the accepted translations.
    /// A blank answer never matches — blanks score zero, not plus two.
    pub fn accepts(&self, answer: &str) -> bool {
        let answer = normalize(answer);
        !answer.is_empty() && self.translations.iter().any(|t| *t == answer)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Produces batches of distinct challenge words for duels.
pub trait WordSource: Send + Sync + 'static {
    /// Returns exactly `count` distinct challenges.
    ///
    /// # Errors
    /// [`WordsError::NotEnoughWords`] if the source holds fewer than
    /// `count` words.
    fn draw(&self, count: usize) -> Result<Vec<Challenge>, WordsError>;
}

// ---------------------------------------------------------------------------
// FileWordSource
// ---------------------------------------------------------------------------

/// A dictionary loaded from disk, one entry per line:
///
/// ```text
/// # source word, then comma-separated accepted translations
/// casa/house,home
/// cane/dog
/// ```
///
/// Blank lines and `#` comments are ignored. Each `draw` returns a fresh
/// random batch.
#[derive(Debug)]
pub struct FileWordSource {
    entries: Vec<Challenge>,
}

impl FileWordSource {
    /// Loads and validates a dictionary file.
    ///
    /// # Errors
    /// I/O failures, malformed lines, and duplicate source words are all
    /// reported with their line number.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WordsError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses dictionary text. Separate from [`load`](Self::load) so
    /// tests can feed literals.
    pub fn parse(text: &str) -> Result<Self, WordsError> {
        let mut entries: Vec<Challenge> = Vec::new();
        let mut seen = HashSet::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }
            let malformed = || WordsError::Malformed {
                line,
                content: content.to_string(),
            };

            let (word, translations) = content.split_once('/').ok_or_else(malformed)?;
            let word = word.trim();
            if word.is_empty() {
                return Err(malformed());
            }
            let translations: Vec<&str> = translations
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect();
            if translations.is_empty() {
                return Err(malformed());
            }
            if !seen.insert(word.to_lowercase()) {
                return Err(WordsError::DuplicateWord {
                    line,
                    word: word.to_string(),
                });
            }
            entries.push(Challenge::new(word, &translations));
        }

        Ok(Self { entries })
    }

    /// Number of entries in the dictionary.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl WordSource for FileWordSource {
    fn draw(&self, count: usize) -> Result<Vec<Challenge>, WordsError> {
        if count > self.entries.len() {
            return Err(WordsError::NotEnoughWords {
                need: count,
                have: self.entries.len(),
            });
        }
        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.shuffle(&mut rand::rng());
        Ok(indices
            .into_iter()
            .take(count)
            .map(|i| self.entries[i].clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// FixedWordSource
// ---------------------------------------------------------------------------

/// Serves a caller-supplied list, in order. Deterministic by design.
pub struct FixedWordSource {
    entries: Vec<Challenge>,
}

impl FixedWordSource {
    pub fn new(entries: Vec<Challenge>) -> Self {
        Self { entries }
    }
}

impl WordSource for FixedWordSource {
    fn draw(&self, count: usize) -> Result<Vec<Challenge>, WordsError> {
        if count > self.entries.len() {
            return Err(WordsError::NotEnoughWords {
                need: count,
                have: self.entries.len(),
            });
        }
        Ok(self.entries[..count].to_vec())
    }
}

// =========================================================================
// Tests
// =========================================================================
