//! Error types for match orchestration.

use quizzle_store::StoreError;
use quizzle_words::WordsError;

/// Errors that can abort a duel.
///
/// These never reach a client as-is: the server logs them and the
/// challenger's session simply resumes. Players that already connected
/// see their duel socket close.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A duel socket operation failed.
    #[error("duel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The word source could not produce a batch.
    #[error(transparent)]
    Words(#[from] WordsError),

    /// Persisting the score deltas failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The players did not both reach the duel listener in time.
    #[error("duel rendezvous timed out")]
    RendezvousTimedOut,
}
