//! Duel orchestration for Word Quizzle.
//!
//! A match between two friends runs in two phases, both driven by the
//! single task that handled the challenger's request:
//!
//! 1. **Invitation** — a UDP round trip to the challenged player's
//!    registered endpoint, bounded by the invitation window
//!    ([`MatchOrchestrator::invite`]).
//! 2. **Duel** — both players connect to an ephemeral listener, race
//!    through the same word batch line by line, and get scored
//!    ([`MatchOrchestrator::run`]).
//!
//! The orchestrator owns every duel resource (listener, peer sockets,
//! UDP socket) for the lifetime of the match; the caller keeps owning
//! the challenger's session socket throughout.

mod duel;
mod error;
mod invite;
mod scoring;

pub use duel::{DuelConfig, DuelReport, DuelSetup, MatchOrchestrator};
pub use error::MatchError;
pub use invite::InviteOutcome;
pub use scoring::{score_answers, settle, DuelOutcome, CORRECT_POINTS, WINNER_BONUS, WRONG_PENALTY};
