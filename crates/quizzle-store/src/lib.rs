//! Persistent user store for Word Quizzle.
//!
//! This crate owns everything the server must remember across restarts:
//! who is registered, their password fingerprints, their cumulative
//! scores, and the (symmetric) friends graph.
//!
//! # Concurrency contract
//!
//! [`UserStore`] serializes writers behind a single write lock; readers
//! take snapshot clones and never block each other. Every successful
//! mutation rewrites the full store image on disk (write a temp file,
//! fsync, rename over the live file) before the mutator returns, so a
//! crash can lose at most the mutation in flight, never corrupt the file.

mod error;
mod store;
mod user;

pub use error::StoreError;
pub use store::{FriendshipOutcome, RegisterOutcome, UserStore};
pub use user::{PasswordFingerprint, UserRecord};
