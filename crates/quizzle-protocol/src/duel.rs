//! Invitation datagrams and duel-channel payloads.
//!
//! The invitation handshake is a single round trip over UDP:
//!
//! ```text
//! server → challenged   "<challenger>/<duelPort>"
//! challenged → server   "Y" | "N"
//! server → challenged   "TIMEOUT/<challenger>"     (only if no reply came)
//! ```
//!
//! The duel itself runs over TCP. Players send `START/<nick>` to ask for
//! the first word, then `<translation>/<nick>` per round; the server
//! answers with one word per line and closes the exchange with an
//! `END/...` line.

use crate::ProtocolError;

/// The literal a player sends (in place of a translation) to request the
/// first word of its batch.
const START: &str = "START";

/// The prefix of the final duel line.
const END: &str = "END/";

// ---------------------------------------------------------------------------
// Invitation handshake
// ---------------------------------------------------------------------------

/// A match invitation, sent to the challenged player's datagram endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    /// Nickname of the player issuing the challenge.
    pub challenger: String,
    /// Port of the ephemeral duel listener both players must connect to.
    pub duel_port: u16,
}

impl Invitation {
    /// Formats the invitation as it travels on the wire.
    pub fn encode(&self) -> String {
        format!("{}/{}", self.challenger, self.duel_port)
    }

    /// Parses an invitation datagram.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedInvitation`] when the payload is
    /// not `<challenger>/<port>`.
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedInvitation(payload.to_string());
        let (challenger, port) = payload.split_once('/').ok_or_else(malformed)?;
        if challenger.is_empty() {
            return Err(malformed());
        }
        let duel_port = port.parse().map_err(|_| malformed())?;
        Ok(Self {
            challenger: challenger.to_string(),
            duel_port,
        })
    }
}

/// The challenged player's answer to an [`Invitation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteReply {
    Accept,
    Refuse,
}

impl InviteReply {
    /// The one-byte wire form, `Y` or `N`.
    pub fn encode(&self) -> &'static str {
        match self {
            Self::Accept => "Y",
            Self::Refuse => "N",
        }
    }

    /// Parses a reply datagram.
    ///
    /// # Errors
    /// Returns [`ProtocolError::BadInviteReply`] for anything other than
    /// `Y` or `N`.
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        match payload.trim() {
            "Y" => Ok(Self::Accept),
            "N" => Ok(Self::Refuse),
            other => Err(ProtocolError::BadInviteReply(other.to_string())),
        }
    }
}

/// The datagram telling the challenged player that the invitation from
/// `challenger` expired, so its pending-invite table can evict it.
pub fn timeout_notice(challenger: &str) -> String {
    format!("TIMEOUT/{challenger}")
}

// ---------------------------------------------------------------------------
// Duel channel
// ---------------------------------------------------------------------------

/// One line received from a player on its duel socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuelLine {
    /// `START/<nick>` — the player introduced itself and wants the first
    /// word of the batch.
    Start { nickname: String },
    /// `<translation>/<nick>` — an answer for the previously sent word.
    /// An empty `text` means the player skipped the word.
    Answer { text: String, nickname: String },
}

impl DuelLine {
    /// Parses a duel payload of the form `<text>/<nickname>`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedDuelLine`] when the separator or
    /// the nickname is missing.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let (text, nickname) = line
            .split_once('/')
            .ok_or_else(|| ProtocolError::MalformedDuelLine(line.to_string()))?;
        if nickname.is_empty() {
            return Err(ProtocolError::MalformedDuelLine(line.to_string()));
        }
        let nickname = nickname.to_string();
        if text == START {
            Ok(Self::Start { nickname })
        } else {
            Ok(Self::Answer {
                text: text.to_string(),
                nickname,
            })
        }
    }

    /// The nickname the line was tagged with, whichever variant it is.
    pub fn nickname(&self) -> &str {
        match self {
            Self::Start { nickname } | Self::Answer { nickname, .. } => nickname,
        }
    }
}

/// Formats the terminal duel line.
///
/// `verdict` is one of `won`, `lost`, `drew`; the `Time out: ` prefix
/// marks duels ended by the wall-clock deadline rather than completion.
pub fn end_line(score: i32, verdict: &str, timed_out: bool) -> String {
    if timed_out {
        format!("{END}Time out: you have scored: {score} points. You {verdict}.")
    } else {
        format!("{END}You have scored: {score} points. You {verdict}.")
    }
}

// =========================================================================
// Tests
// =========================================================================
