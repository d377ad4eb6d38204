//! User records and password fingerprints.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A non-reversible, comparable token standing in for a password.
///
/// SHA-256 over a random per-user salt plus the password. The salt makes
/// identical passwords produce different fingerprints, so the store file
/// leaks nothing about password reuse.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordFingerprint {
    salt: String,
    digest: String,
}

impl PasswordFingerprint {
    /// Fingerprints a password under a freshly drawn salt.
    pub fn new(password: &str) -> Self {
        let salt_bytes: [u8; 16] = rand::rng().random();
        let salt = hex(&salt_bytes);
        let digest = Self::digest_for(&salt, password);
        Self { salt, digest }
    }

    /// Returns `true` if `password` fingerprints to this token.
    pub fn matches(&self, password: &str) -> bool {
        Self::digest_for(&self.salt, password) == self.digest
    }

    fn digest_for(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex(&hasher.finalize())
    }
}

/// Neither the salt nor the digest belongs in logs.
impl fmt::Debug for PasswordFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordFingerprint(..)")
    }
}

/// One registered user, as persisted in the store image.
///
/// Created on registration, never destroyed. `friends` is kept sorted and
/// symmetric with each friend's own list; only [`UserStore`] mutates it.
///
/// [`UserStore`]: crate::UserStore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub nickname: String,
    pub fingerprint: PasswordFingerprint,
    pub score: i32,
    pub friends: Vec<String>,
}

impl UserRecord {
    /// Creates a fresh record: zero score, no friends.
    pub fn new(nickname: &str, password: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            fingerprint: PasswordFingerprint::new(password),
            score: 0,
            friends: Vec::new(),
        }
    }

    /// Returns `true` if `nickname` is in this user's friends list.
    pub fn is_friend(&self, nickname: &str) -> bool {
        self.friends
            .binary_search_by(|f| f.as_str().cmp(nickname))
            .is_ok()
    }

    /// Inserts `nickname` keeping the list sorted. No-op if present.
    pub(crate) fn insert_friend(&mut self, nickname: &str) {
        if let Err(pos) = self
            .friends
            .binary_search_by(|f| f.as_str().cmp(nickname))
        {
            self.friends.insert(pos, nickname.to_string());
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
