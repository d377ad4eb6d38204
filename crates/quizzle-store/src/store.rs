//! The user store: one map from nickname to record, durable after every
//! mutation.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::{StoreError, UserRecord};

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The nickname was free; the record now exists on disk.
    Created,
    /// The nickname is taken. Nothing changed.
    AlreadyExists,
}

/// Outcome of a friendship request between two existing users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipOutcome {
    /// Both lists now contain the other user.
    Added,
    /// The edge already existed. Nothing changed.
    AlreadyFriends,
}

/// Persistent mapping nickname → [`UserRecord`].
///
/// Writers are mutually exclusive; the durability write happens inside
/// the critical section, so two racing mutators can never interleave
/// their images on disk. Readers clone a snapshot under the read lock
/// and may observe either pre- or post-state of a concurrent write,
/// never a torn record.
///
/// Persistence failures are logged and swallowed: the in-memory mutation
/// stands and the caller still observes success. The store trades
/// durability for availability on a full disk rather than locking every
/// player out.
pub struct UserStore {
    path: PathBuf,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserStore {
    /// Opens the store backed by `path`, loading the persisted image if
    /// one exists.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the file exists but cannot be read,
    /// or [`StoreError::Malformed`] if it does not parse as a store image.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let users = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// Registers a new user. Exactly one of two concurrent identical
    /// registrations wins.
    pub fn register(&self, nickname: &str, password: &str) -> RegisterOutcome {
        let mut users = self.users.write().expect("store lock poisoned");
        if users.contains_key(nickname) {
            return RegisterOutcome::AlreadyExists;
        }
        users.insert(nickname.to_string(), UserRecord::new(nickname, password));
        tracing::info!(%nickname, "user registered");
        self.persist(&users);
        RegisterOutcome::Created
    }

    /// Snapshot read of one record.
    pub fn lookup(&self, nickname: &str) -> Option<UserRecord> {
        self.users
            .read()
            .expect("store lock poisoned")
            .get(nickname)
            .cloned()
    }

    /// Checks `password` against the stored fingerprint. Unknown users
    /// never verify.
    pub fn verify(&self, nickname: &str, password: &str) -> bool {
        self.users
            .read()
            .expect("store lock poisoned")
            .get(nickname)
            .is_some_and(|user| user.fingerprint.matches(password))
    }

    /// Makes `a` and `b` friends of each other, mutating both records in
    /// one critical section.
    ///
    /// # Errors
    /// [`StoreError::SelfFriendship`] if `a == b`,
    /// [`StoreError::UnknownUser`] if either nickname is unregistered.
    pub fn add_friendship(&self, a: &str, b: &str) -> Result<FriendshipOutcome, StoreError> {
        if a == b {
            return Err(StoreError::SelfFriendship);
        }
        let mut users = self.users.write().expect("store lock poisoned");
        for nick in [a, b] {
            if !users.contains_key(nick) {
                return Err(StoreError::UnknownUser(nick.to_string()));
            }
        }
        // Symmetry invariant: checking one direction is enough.
        if users[a].is_friend(b) {
            return Ok(FriendshipOutcome::AlreadyFriends);
        }
        users.get_mut(a).expect("checked above").insert_friend(b);
        users.get_mut(b).expect("checked above").insert_friend(a);
        tracing::info!(user = %a, friend = %b, "friendship added");
        self.persist(&users);
        Ok(FriendshipOutcome::Added)
    }

    /// Adds `delta` to a user's cumulative score.
    ///
    /// # Errors
    /// [`StoreError::UnknownUser`] if the nickname is unregistered.
    pub fn adjust_score(&self, nickname: &str, delta: i32) -> Result<(), StoreError> {
        let mut users = self.users.write().expect("store lock poisoned");
        let user = users
            .get_mut(nickname)
            .ok_or_else(|| StoreError::UnknownUser(nickname.to_string()))?;
        user.score += delta;
        let score = user.score;
        tracing::info!(%nickname, delta, score, "score adjusted");
        self.persist(&users);
        Ok(())
    }

    /// Rewrites the on-disk image. Called with the write lock held.
    fn persist(&self, users: &HashMap<String, UserRecord>) {
        if let Err(error) = self.write_image(users) {
            tracing::error!(
                path = %self.path.display(),
                %error,
                "failed to persist user store"
            );
        }
    }

    /// Write new, fsync, rename over the live file.
    fn write_image(&self, users: &HashMap<String, UserRecord>) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(users)?;
        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// A store backed by a fresh file under the system temp directory.
    fn scratch_store(tag: &str) -> UserStore {
        let mut path = std::env::temp_dir();
        path.push(format!("quizzle-store-{tag}-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        UserStore::open(path).expect("fresh store should open")
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_new_nickname_creates_clean_record() {
        let store = scratch_store("register-new");

        assert_eq!(store.register("alice", "pw"), RegisterOutcome::Created);

        let alice = store.lookup("alice").expect("record should exist");
        assert_eq!(alice.score, 0);
        assert!(alice.friends.is_empty());
    }

    #[test]
    fn test_register_taken_nickname_changes_nothing() {
        let store = scratch_store("register-taken");
        store.register("alice", "pw");

        assert_eq!(
            store.register("alice", "other"),
            RegisterOutcome::AlreadyExists
        );

        // The original password still verifies; the second one never took.
        assert!(store.verify("alice", "pw"));
        assert!(!store.verify("alice", "other"));
    }

    // =====================================================================
    // verify()
    // =====================================================================

    #[test]
    fn test_verify_wrong_password_fails() {
        let store = scratch_store("verify-wrong");
        store.register("alice", "pw");

        assert!(!store.verify("alice", "nope"));
    }

    #[test]
    fn test_verify_unknown_user_fails() {
        let store = scratch_store("verify-unknown");

        assert!(!store.verify("ghost", "pw"));
    }

    // =====================================================================
    // add_friendship()
    // =====================================================================

    #[test]
    fn test_add_friendship_is_symmetric() {
        let store = scratch_store("friends-symmetric");
        store.register("alice", "pw");
        store.register("bob", "pw");

        let outcome = store.add_friendship("alice", "bob").unwrap();

        assert_eq!(outcome, FriendshipOutcome::Added);
        assert!(store.lookup("alice").unwrap().is_friend("bob"));
        assert!(store.lookup("bob").unwrap().is_friend("alice"));
    }

    #[test]
    fn test_add_friendship_twice_reports_already_friends() {
        let store = scratch_store("friends-twice");
        store.register("alice", "pw");
        store.register("bob", "pw");
        store.add_friendship("alice", "bob").unwrap();

        // Same edge from either side.
        assert_eq!(
            store.add_friendship("alice", "bob").unwrap(),
            FriendshipOutcome::AlreadyFriends
        );
        assert_eq!(
            store.add_friendship("bob", "alice").unwrap(),
            FriendshipOutcome::AlreadyFriends
        );
    }

    #[test]
    fn test_add_friendship_rejects_self() {
        let store = scratch_store("friends-self");
        store.register("alice", "pw");

        assert!(matches!(
            store.add_friendship("alice", "alice"),
            Err(StoreError::SelfFriendship)
        ));
        assert!(!store.lookup("alice").unwrap().is_friend("alice"));
    }

    #[test]
    fn test_add_friendship_rejects_unknown_users() {
        let store = scratch_store("friends-unknown");
        store.register("alice", "pw");

        assert!(matches!(
            store.add_friendship("alice", "ghost"),
            Err(StoreError::UnknownUser(n)) if n == "ghost"
        ));
        assert!(matches!(
            store.add_friendship("ghost", "alice"),
            Err(StoreError::UnknownUser(n)) if n == "ghost"
        ));
        // The half-edge must not have been written.
        assert!(store.lookup("alice").unwrap().friends.is_empty());
    }

    #[test]
    fn test_add_friendship_keeps_lists_sorted() {
        let store = scratch_store("friends-sorted");
        for nick in ["alice", "carol", "bob", "dave"] {
            store.register(nick, "pw");
        }
        store.add_friendship("alice", "carol").unwrap();
        store.add_friendship("alice", "bob").unwrap();
        store.add_friendship("alice", "dave").unwrap();

        assert_eq!(
            store.lookup("alice").unwrap().friends,
            ["bob", "carol", "dave"]
        );
    }

    // =====================================================================
    // adjust_score()
    // =====================================================================

    #[test]
    fn test_adjust_score_accumulates_deltas() {
        let store = scratch_store("score-accumulate");
        store.register("alice", "pw");

        store.adjust_score("alice", 7).unwrap();
        store.adjust_score("alice", -2).unwrap();

        assert_eq!(store.lookup("alice").unwrap().score, 5);
    }

    #[test]
    fn test_adjust_score_can_go_negative() {
        let store = scratch_store("score-negative");
        store.register("alice", "pw");

        store.adjust_score("alice", -4).unwrap();

        assert_eq!(store.lookup("alice").unwrap().score, -4);
    }

    #[test]
    fn test_adjust_score_unknown_user_returns_error() {
        let store = scratch_store("score-unknown");

        assert!(matches!(
            store.adjust_score("ghost", 1),
            Err(StoreError::UnknownUser(_))
        ));
    }

    // =====================================================================
    // Persistence
    // =====================================================================

    #[test]
    fn test_reopen_round_trips_every_field() {
        let mut path = std::env::temp_dir();
        path.push(format!("quizzle-store-reopen-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        {
            let store = UserStore::open(&path).unwrap();
            store.register("alice", "pw");
            store.register("bob", "pw2");
            store.add_friendship("alice", "bob").unwrap();
            store.adjust_score("alice", 7).unwrap();
        }

        let reopened = UserStore::open(&path).unwrap();
        let alice = reopened.lookup("alice").unwrap();
        assert_eq!(alice.score, 7);
        assert_eq!(alice.friends, ["bob"]);
        assert!(reopened.verify("alice", "pw"));
        assert!(reopened.verify("bob", "pw2"));
        assert_eq!(reopened.lookup("bob").unwrap().friends, ["alice"]);
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let store = scratch_store("open-missing");
        assert!(store.lookup("anyone").is_none());
    }

    #[test]
    fn test_open_malformed_file_returns_error() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "quizzle-store-malformed-{}.json",
            std::process::id()
        ));
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            UserStore::open(&path),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_mutation_succeeds_when_persistence_fails() {
        // Availability over durability: a store pointed at an unwritable
        // location still serves registrations from memory.
        let mut path = std::env::temp_dir();
        path.push(format!("quizzle-no-such-dir-{}", std::process::id()));
        path.push("store.json");
        let store = UserStore::open(&path).unwrap();

        assert_eq!(store.register("alice", "pw"), RegisterOutcome::Created);
        assert!(store.verify("alice", "pw"));
    }
}
