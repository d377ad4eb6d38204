//! Challenge-word sources for Word Quizzle duels.
//!
//! A duel needs a batch of distinct source words, each with the set of
//! translations the scorer will accept. Where those come from is behind
//! the [`WordSource`] trait:
//!
//! - [`FileWordSource`] draws random batches from a dictionary file —
//!   the production source.
//! - [`FixedWordSource`] serves a caller-supplied list in order — for
//!   tests and demos, where determinism beats variety.

mod error;
mod source;

pub use error::WordsError;
pub use source::{Challenge, FileWordSource, FixedWordSource, WordSource};
