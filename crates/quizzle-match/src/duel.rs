//! Phases two to four: rendezvous, round-by-round exchange, scoring.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use quizzle_protocol::{end_line, DuelLine};
use quizzle_store::UserStore;
use quizzle_words::{Challenge, WordSource};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::invite::send_invitation;
use crate::scoring::{score_answers, settle};
use crate::{InviteOutcome, MatchError};

/// Timing and sizing knobs for one duel.
#[derive(Debug, Clone)]
pub struct DuelConfig {
    /// Wall-clock budget for the duel proper (and for the rendezvous
    /// that precedes it).
    pub duration: Duration,
    /// How long the challenged player gets to answer the invitation.
    pub invite_window: Duration,
    /// Words in the batch both players translate.
    pub word_count: usize,
}

/// Who is dueling whom, and where the challenged player listens.
#[derive(Debug, Clone)]
pub struct DuelSetup {
    pub challenger: String,
    pub challenged: String,
    /// Session-socket address of the challenger; admission filter for
    /// the duel listener.
    pub challenger_ip: IpAddr,
    /// Address part of the challenged player's registered endpoint.
    pub challenged_ip: IpAddr,
    /// Where the invitation datagram goes.
    pub challenged_endpoint: SocketAddr,
}

/// What a finished duel settled on. Scores include the winner bonus.
#[derive(Debug, Clone, Copy)]
pub struct DuelReport {
    pub challenger_points: i32,
    pub challenged_points: i32,
    pub timed_out: bool,
}

/// Runs one duel start to finish, owning every duel resource.
///
/// Lives inside the worker task that handled the challenger's match
/// request: the caller stays parked on [`run`](Self::run) until the
/// duel is over, which is what keeps the challenger's session socket
/// quiet for the duration.
pub struct MatchOrchestrator {
    setup: DuelSetup,
    config: DuelConfig,
    listener: TcpListener,
    port: u16,
}

impl MatchOrchestrator {
    /// Binds the ephemeral duel listener. No traffic happens yet.
    pub async fn prepare(setup: DuelSetup, config: DuelConfig) -> Result<Self, MatchError> {
        let listener = TcpListener::bind(("0.0.0.0", 0)).await?;
        let port = listener.local_addr()?.port();
        tracing::debug!(
            challenger = %setup.challenger,
            challenged = %setup.challenged,
            port,
            "duel listener bound"
        );
        Ok(Self {
            setup,
            config,
            listener,
            port,
        })
    }

    /// The port players must connect to, as advertised in the invitation.
    pub fn duel_port(&self) -> u16 {
        self.port
    }

    /// Phase one: the UDP invitation round trip.
    pub async fn invite(&self) -> Result<InviteOutcome, MatchError> {
        Ok(send_invitation(
            &self.setup.challenger,
            self.port,
            self.setup.challenged_endpoint,
            self.config.invite_window,
        )
        .await?)
    }

    /// Phases two to four: wait for both players, run the rounds, score,
    /// persist, deliver the `END/` lines.
    ///
    /// # Errors
    /// Fails if the players never rendezvous, the word source cannot
    /// produce a batch, or persisting the deltas hits an unknown user.
    /// Peer crashes are not errors — they are scored as blanks.
    pub async fn run(
        self,
        store: &UserStore,
        words: &dyn WordSource,
    ) -> Result<DuelReport, MatchError> {
        let (first, second) = self.rendezvous().await?;
        let mut a = Peer::accept(first);
        let mut b = Peer::accept(second);

        let batch = words.draw(self.config.word_count)?;
        let n = self.config.word_count;
        let expected = (self.setup.challenger.as_str(), self.setup.challenged.as_str());

        let deadline = Instant::now() + self.config.duration;
        let mut timed_out = false;

        while !(a.state.finished(n) && b.state.finished(n)) {
            tokio::select! {
                _ = time::sleep_until(deadline) => {
                    timed_out = true;
                    break;
                }
                event = a.events.recv(), if !a.state.finished(n) => {
                    let other_claim = b.state.nickname.clone();
                    handle_peer_event(&mut a, event, &batch, expected, other_claim, n).await;
                }
                event = b.events.recv(), if !b.state.finished(n) => {
                    let other_claim = a.state.nickname.clone();
                    handle_peer_event(&mut b, event, &batch, expected, other_claim, n).await;
                }
            }
        }

        // Map the two accepted sockets onto challenger/challenged. The
        // START line is the authoritative identity; a peer that crashed
        // before introducing itself takes whichever role is left.
        let (mut challenger_peer, mut challenged_peer) =
            if challenger_is_first(&a.state.nickname, &b.state.nickname, expected.0) {
                (a, b)
            } else {
                (b, a)
            };

        let raw_challenger = score_answers(&challenger_peer.state.answers, &batch);
        let raw_challenged = score_answers(&challenged_peer.state.answers, &batch);
        let ((challenger_points, challenger_outcome), (challenged_points, challenged_outcome)) =
            settle(raw_challenger, raw_challenged);

        store.adjust_score(&self.setup.challenger, challenger_points)?;
        store.adjust_score(&self.setup.challenged, challenged_points)?;

        challenger_peer
            .send_final(&end_line(
                challenger_points,
                challenger_outcome.verdict(),
                timed_out,
            ))
            .await;
        challenged_peer
            .send_final(&end_line(
                challenged_points,
                challenged_outcome.verdict(),
                timed_out,
            ))
            .await;

        tracing::info!(
            challenger = %self.setup.challenger,
            challenged = %self.setup.challenged,
            challenger_points,
            challenged_points,
            timed_out,
            "duel finished"
        );

        Ok(DuelReport {
            challenger_points,
            challenged_points,
            timed_out,
        })
    }

    /// Phase two: accept both players on the duel listener.
    ///
    /// Admission is by source address — a connection must come from one
    /// of the two registered IPs. Bounded by the match duration so an
    /// absent player cannot pin the worker forever.
    async fn rendezvous(&self) -> Result<(TcpStream, TcpStream), MatchError> {
        let deadline = Instant::now() + self.config.duration;
        let mut first: Option<TcpStream> = None;

        loop {
            let (stream, addr) = match time::timeout_at(deadline, self.listener.accept()).await {
                Err(_elapsed) => return Err(MatchError::RendezvousTimedOut),
                Ok(Err(error)) => {
                    tracing::warn!(%error, "duel accept failed");
                    continue;
                }
                Ok(Ok(pair)) => pair,
            };

            let ip = addr.ip();
            if ip != self.setup.challenger_ip && ip != self.setup.challenged_ip {
                tracing::warn!(%addr, "rejecting duel connection from unregistered address");
                continue;
            }

            tracing::debug!(%addr, "duel peer connected");
            match first.take() {
                None => first = Some(stream),
                Some(prev) => return Ok((prev, stream)),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

/// A line from a peer's duel socket, or the end of it.
enum PeerEvent {
    Line(String),
    Closed,
}

/// Round progress for one duel socket.
///
/// `cursor` counts words sent: `0` before `START`, `k` once `words[k-1]`
/// is out, `word_count + 1` once the last answer (or a crash) landed.
/// `answers[i]` always answers `words[i]`.
struct RoundState {
    nickname: Option<String>,
    cursor: usize,
    answers: Vec<String>,
}

impl RoundState {
    fn new() -> Self {
        Self {
            nickname: None,
            cursor: 0,
            answers: Vec::new(),
        }
    }

    fn finished(&self, word_count: usize) -> bool {
        self.cursor > word_count
    }

    /// Records an answer for the previously sent word. Returns the index
    /// of the next word to send, if one is left.
    fn record_answer(&mut self, text: String, word_count: usize) -> Option<usize> {
        self.answers.push(text);
        let next = (self.cursor < word_count).then_some(self.cursor);
        self.cursor += 1;
        next
    }

    /// Promotes the peer to finished with every remaining answer blank.
    fn crash(&mut self, word_count: usize) {
        self.answers.resize(word_count, String::new());
        self.cursor = word_count + 1;
    }
}

/// One accepted duel socket: a write half here, a reader task feeding
/// `events`, and the round progress.
struct Peer {
    writer: OwnedWriteHalf,
    events: mpsc::Receiver<PeerEvent>,
    state: RoundState,
}

impl Peer {
    fn accept(stream: TcpStream) -> Self {
        let (read_half, writer) = stream.into_split();
        Self {
            writer,
            events: spawn_reader(read_half),
            state: RoundState::new(),
        }
    }

    async fn send_word(&mut self, word: &str) -> std::io::Result<()> {
        self.writer.write_all(format!("{word}\n").as_bytes()).await
    }

    /// Delivers the `END/` line. A peer that already crashed simply
    /// misses it.
    async fn send_final(&mut self, line: &str) {
        if let Err(error) = self.writer.write_all(format!("{line}\n").as_bytes()).await {
            tracing::debug!(%error, "peer gone before final duel line");
        }
    }
}

/// Reads lines off a duel socket and forwards them as events. A short
/// read, an error, or EOF all end in a single `Closed`.
fn spawn_reader(read_half: OwnedReadHalf) -> mpsc::Receiver<PeerEvent> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(PeerEvent::Line(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) | Err(_) => {
                    let _ = tx.send(PeerEvent::Closed).await;
                    break;
                }
            }
        }
    });
    rx
}

/// Applies one event to a peer's round state, answering on its socket.
async fn handle_peer_event(
    peer: &mut Peer,
    event: Option<PeerEvent>,
    words: &[Challenge],
    expected: (&str, &str),
    other_claim: Option<String>,
    word_count: usize,
) {
    let line = match event {
        Some(PeerEvent::Line(line)) => line,
        Some(PeerEvent::Closed) | None => {
            tracing::info!(
                nickname = peer.state.nickname.as_deref().unwrap_or("<unknown>"),
                "duel peer crashed, remaining answers blank"
            );
            peer.state.crash(word_count);
            return;
        }
    };

    let parsed = match DuelLine::parse(&line) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::debug!(%error, "ignoring malformed duel line");
            return;
        }
    };

    match parsed {
        DuelLine::Start { nickname } => {
            if peer.state.nickname.is_some() {
                tracing::debug!(%nickname, "duplicate START ignored");
                return;
            }
            let is_expected = nickname == expected.0 || nickname == expected.1;
            if !is_expected || other_claim.as_deref() == Some(nickname.as_str()) {
                tracing::warn!(%nickname, "START from unexpected nickname ignored");
                return;
            }
            peer.state.nickname = Some(nickname);
            if peer.send_word(&words[0].word).await.is_err() {
                peer.state.crash(word_count);
                return;
            }
            peer.state.cursor = 1;
        }
        DuelLine::Answer { text, nickname } => {
            if peer.state.nickname.as_deref() != Some(nickname.as_str()) {
                tracing::debug!(%nickname, "answer with wrong nickname ignored");
                return;
            }
            if peer.state.cursor == 0 || peer.state.finished(word_count) {
                return;
            }
            if let Some(next) = peer.state.record_answer(text, word_count) {
                if peer.send_word(&words[next].word).await.is_err() {
                    peer.state.crash(word_count);
                }
            }
        }
    }
}

/// Decides whether the first accepted socket plays the challenger role.
fn challenger_is_first(
    first_claim: &Option<String>,
    second_claim: &Option<String>,
    challenger: &str,
) -> bool {
    match (first_claim, second_claim) {
        (Some(nickname), _) => nickname == challenger,
        (None, Some(nickname)) => nickname != challenger,
        (None, None) => true,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // RoundState
    // =====================================================================

    #[test]
    fn test_round_state_progresses_through_a_batch() {
        let mut state = RoundState::new();
        assert!(!state.finished(2));

        state.nickname = Some("alice".into());
        state.cursor = 1; // START answered with words[0]

        assert_eq!(state.record_answer("house".into(), 2), Some(1));
        assert!(!state.finished(2));

        assert_eq!(state.record_answer("dog".into(), 2), None);
        assert!(state.finished(2));
        assert_eq!(state.answers, ["house", "dog"]);
    }

    #[test]
    fn test_round_state_crash_blanks_remaining_answers() {
        let mut state = RoundState::new();
        state.cursor = 1;
        assert_eq!(state.record_answer("house".into(), 3), Some(1));

        state.crash(3);

        assert!(state.finished(3));
        assert_eq!(state.answers, ["house", "", ""]);
    }

    #[test]
    fn test_round_state_crash_before_start_blanks_everything() {
        let mut state = RoundState::new();

        state.crash(2);

        assert!(state.finished(2));
        assert_eq!(state.answers, ["", ""]);
    }

    #[test]
    fn test_round_state_crash_after_finish_keeps_answers() {
        let mut state = RoundState::new();
        state.cursor = 1;
        assert_eq!(state.record_answer("house".into(), 1), None);
        assert!(state.finished(1));

        state.crash(1);

        assert_eq!(state.answers, ["house"]);
    }

    // =====================================================================
    // challenger_is_first()
    // =====================================================================

    #[test]
    fn test_roles_follow_start_lines() {
        let alice = Some("alice".to_string());
        let bob = Some("bob".to_string());
        assert!(challenger_is_first(&alice, &bob, "alice"));
        assert!(!challenger_is_first(&bob, &alice, "alice"));
    }

    #[test]
    fn test_roles_infer_silent_peer_from_the_other() {
        let bob = Some("bob".to_string());
        // First socket never introduced itself; the second is the
        // challenged player, so the first must be the challenger.
        assert!(challenger_is_first(&None, &bob, "alice"));
        // And the other way around.
        assert!(!challenger_is_first(&None, &Some("alice".to_string()), "alice"));
    }

    #[test]
    fn test_roles_default_to_slot_order_when_both_silent() {
        assert!(challenger_is_first(&None, &None, "alice"));
    }
}
