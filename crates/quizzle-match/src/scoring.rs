//! Duel scoring: per-answer points and the winner bonus.

use quizzle_words::Challenge;

/// Points for an answer in the accepted-translation set.
pub const CORRECT_POINTS: i32 = 2;
/// Points taken for an answer outside the set. Blanks cost nothing.
pub const WRONG_PENALTY: i32 = 1;
/// Points added to the strictly higher final score.
pub const WINNER_BONUS: i32 = 3;

/// How a duel ended for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelOutcome {
    Won,
    Lost,
    Drew,
}

impl DuelOutcome {
    /// The word used in the terminal duel line.
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Drew => "drew",
        }
    }
}

/// Scores one player's recorded answers against the word batch.
///
/// `answers[i]` answers `challenges[i]`; a player that finished early
/// (crash, deadline) simply has fewer recorded answers, and the missing
/// ones count as blanks — zero either way.
pub fn score_answers(answers: &[String], challenges: &[Challenge]) -> i32 {
    answers
        .iter()
        .zip(challenges)
        .map(|(answer, challenge)| {
            if answer.trim().is_empty() {
                0
            } else if challenge.accepts(answer) {
                CORRECT_POINTS
            } else {
                -WRONG_PENALTY
            }
        })
        .sum()
}

/// Applies the winner bonus and decides both verdicts.
///
/// The strictly higher score takes [`WINNER_BONUS`] — also when both
/// scores are negative. A tie awards nothing to either side.
pub fn settle(challenger: i32, challenged: i32) -> ((i32, DuelOutcome), (i32, DuelOutcome)) {
    use DuelOutcome::*;
    match challenger.cmp(&challenged) {
        std::cmp::Ordering::Greater => ((challenger + WINNER_BONUS, Won), (challenged, Lost)),
        std::cmp::Ordering::Less => ((challenger, Lost), (challenged + WINNER_BONUS, Won)),
        std::cmp::Ordering::Equal => ((challenger, Drew), (challenged, Drew)),
    }
}

// =========================================================================
// Tests
// =========================================================================
