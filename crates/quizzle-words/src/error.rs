//! Error types for word sources.

/// Errors that can occur while loading a dictionary or drawing a batch.
#[derive(Debug, thiserror::Error)]
pub enum WordsError {
    /// The dictionary file could not be read.
    #[error("cannot read dictionary: {0}")]
    Io(#[from] std::io::Error),

    /// A dictionary line did not match `word/translation[,translation…]`.
    #[error("malformed dictionary entry at line {line}: {content:?}")]
    Malformed { line: usize, content: String },

    /// The same source word appeared twice in the dictionary.
    #[error("duplicate dictionary word at line {line}: {word:?}")]
    DuplicateWord { line: usize, word: String },

    /// The source holds fewer words than a batch needs.
    #[error("dictionary has {have} words, a match needs {need}")]
    NotEnoughWords { need: usize, have: usize },
}
