//! Error types for the presence layer.

use crate::ConnId;

/// Ways a presence bind can fail. Neither case mutates the registry.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The nickname is already online on some connection.
    #[error("{0} is already logged in")]
    NicknameBusy(String),

    /// This connection is already bound to another nickname.
    #[error("connection {0} is already logged in as {1}")]
    ConnectionBusy(ConnId, String),
}
