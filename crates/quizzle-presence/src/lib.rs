//! Online-presence tracking for Word Quizzle.
//!
//! A user is *online* exactly while both registry indexes hold them:
//! connection → nickname (liveness on the session socket) and
//! nickname → datagram endpoint (where match invitations go).
//! [`PresenceRegistry`] keeps the two in lockstep.
//!
//! # Concurrency note
//!
//! `PresenceRegistry` is NOT thread-safe by itself — it uses plain
//! `HashMap`s, not concurrent ones. This is intentional: the registry is
//! shared through a single async mutex at the server-state level, which
//! makes each compound bind/unbind atomic without any rollback dance.

mod error;
mod registry;

pub use error::PresenceError;
pub use registry::PresenceRegistry;

use std::fmt;

/// Opaque identifier for one session connection, allocated at accept
/// time. Stands in for fragile peer-address identity: it survives NAT
/// rewrites and port reuse because it never leaves the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    /// Creates a `ConnId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conn_id_new_and_into_inner() {
        let id = ConnId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_conn_id_display() {
        assert_eq!(ConnId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_conn_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnId::new(1), "alice");
        map.insert(ConnId::new(2), "bob");
        assert_eq!(map[&ConnId::new(1)], "alice");
    }
}
