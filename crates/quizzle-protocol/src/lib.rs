//! Wire protocol for Word Quizzle.
//!
//! This crate defines the "language" that clients and the server speak,
//! on all three channels the service uses:
//!
//! - **Session channel** (long-lived TCP): one ASCII command per line,
//!   opcode first — parsed into [`Request`].
//! - **Invitation channel** (UDP): a single [`Invitation`] datagram, a
//!   one-byte [`InviteReply`], and the [`timeout_notice`] eviction packet.
//! - **Duel channel** (short-lived TCP): [`DuelLine`] payloads from the
//!   players, one challenge word per line from the server, and the final
//!   [`end_line`].
//!
//! The protocol layer only converts between text and typed values. It
//! knows nothing about sockets, users, or match rules.

mod duel;
mod error;
mod request;

pub use duel::{end_line, timeout_notice, DuelLine, Invitation, InviteReply};
pub use error::ProtocolError;
pub use request::Request;
