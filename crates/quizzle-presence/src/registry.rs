//! The presence registry: two consistent indexes over online users.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::{ConnId, PresenceError};

/// Tracks who is online, and where.
///
/// Two indexes, mutated together:
/// - `nicknames`: connection identity → nickname. Lives as long as the
///   session socket; its removal is what makes a crash a logout.
/// - `endpoints`: nickname → datagram endpoint, declared at login. Match
///   invitations are sent here.
///
/// ## Lifecycle
///
/// ```text
/// bind() ──→ [online] ──→ unbind()        (logout or crash)
///    │
///    └─ NicknameBusy / ConnectionBusy     (registry untouched)
/// ```
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    nicknames: HashMap<ConnId, String>,
    endpoints: HashMap<String, SocketAddr>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings a user online: inserts both indexes, or neither.
    ///
    /// # Errors
    /// - [`PresenceError::NicknameBusy`] — the nickname is online on
    ///   another connection.
    /// - [`PresenceError::ConnectionBusy`] — this connection already
    ///   carries a different nickname.
    pub fn bind(
        &mut self,
        conn: ConnId,
        nickname: &str,
        endpoint: SocketAddr,
    ) -> Result<(), PresenceError> {
        if self.endpoints.contains_key(nickname) {
            return Err(PresenceError::NicknameBusy(nickname.to_string()));
        }
        if let Some(current) = self.nicknames.get(&conn) {
            return Err(PresenceError::ConnectionBusy(conn, current.clone()));
        }
        self.nicknames.insert(conn, nickname.to_string());
        self.endpoints.insert(nickname.to_string(), endpoint);
        tracing::info!(%conn, %nickname, %endpoint, "user online");
        Ok(())
    }

    /// Takes whoever is on `conn` offline, removing both indexes.
    /// Idempotent, and safe for connections that never logged in.
    /// Returns the nickname that was bound, if any.
    pub fn unbind(&mut self, conn: ConnId) -> Option<String> {
        let nickname = self.nicknames.remove(&conn)?;
        self.endpoints.remove(&nickname);
        tracing::info!(%conn, %nickname, "user offline");
        Some(nickname)
    }

    /// The nickname logged in on `conn`, if any.
    pub fn nickname_of(&self, conn: ConnId) -> Option<&str> {
        self.nicknames.get(&conn).map(String::as_str)
    }

    /// The datagram endpoint a nickname declared at login, if online.
    pub fn endpoint_of(&self, nickname: &str) -> Option<SocketAddr> {
        self.endpoints.get(nickname).copied()
    }

    /// `true` iff the nickname is currently logged in.
    pub fn is_online(&self, nickname: &str) -> bool {
        self.endpoints.contains_key(nickname)
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.endpoints.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
