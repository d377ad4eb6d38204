//! Unified error type for the server crate.

use quizzle_match::MatchError;
use quizzle_protocol::ProtocolError;
use quizzle_store::StoreError;
use quizzle_words::WordsError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts layer errors on the way up. Nothing here crosses the
/// accept-loop boundary: a failing connection is logged and dropped, the
/// loop keeps running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A socket operation on a session or listener failed.
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A request line could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The user store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A duel could not be orchestrated.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The dictionary could not be loaded.
    #[error(transparent)]
    Words(#[from] WordsError),

    /// Startup-time configuration rejected.
    #[error("configuration error: {0}")]
    Config(String),
}
