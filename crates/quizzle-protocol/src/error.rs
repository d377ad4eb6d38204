//! Error types for the protocol layer.

/// Errors that can occur while parsing wire payloads.
///
/// Each variant names the malformed piece of input. The server answers
/// or ignores these without closing the session; they never escape the
/// handler that produced them.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The request line was empty (or whitespace only).
    #[error("empty request line")]
    EmptyRequest,

    /// The first field of a request was not a number.
    #[error("opcode is not a number: {0:?}")]
    BadOpcode(String),

    /// The opcode is a number but not one the server knows.
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// A request was missing a required argument.
    #[error("opcode {opcode} is missing its {field} argument")]
    MissingArgument { opcode: u8, field: &'static str },

    /// The UDP port argument of a login was not a valid port number.
    #[error("invalid UDP port: {0:?}")]
    InvalidPort(String),

    /// A duel-channel payload did not match `<text>/<nickname>`.
    #[error("malformed duel line: {0:?}")]
    MalformedDuelLine(String),

    /// An invitation payload did not match `<challenger>/<port>`.
    #[error("malformed invitation: {0:?}")]
    MalformedInvitation(String),

    /// An invitation reply other than `Y` or `N`.
    #[error("invitation reply must be Y or N, got {0:?}")]
    BadInviteReply(String),
}
