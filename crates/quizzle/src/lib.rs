//! # Word Quizzle
//!
//! A multiplayer translation-duel service. Registered users log in over a
//! persistent TCP session, build a friends graph, and challenge online
//! friends to timed duels in which both players race to translate the
//! same word batch.
//!
//! This crate ties the layers together: it owns the accept loops (session
//! and registration), the per-connection request handler, and the shared
//! server state. The heavy lifting lives in the sub-crates:
//!
//! ```text
//! session socket → quizzle-protocol (framing)
//!               → handler          (this crate)
//!               → quizzle-store / quizzle-presence (state)
//!               → quizzle-match    (duels, via quizzle-words)
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quizzle::prelude::*;
//!
//! # async fn demo(store: quizzle_store::UserStore, words: quizzle_words::FileWordSource)
//! # -> Result<(), ServerError> {
//! let server = QuizzleServer::builder()
//!     .config(ServerConfig::default())
//!     .build(store, words)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod registration;
mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{QuizzleServer, QuizzleServerBuilder};

/// Re-exports everything a deployment needs.
pub mod prelude {
    pub use crate::{QuizzleServer, QuizzleServerBuilder, ServerConfig, ServerError};

    pub use quizzle_match::{DuelOutcome, MatchError};
    pub use quizzle_presence::{ConnId, PresenceError, PresenceRegistry};
    pub use quizzle_protocol::{ProtocolError, Request};
    pub use quizzle_store::{StoreError, UserRecord, UserStore};
    pub use quizzle_words::{Challenge, FileWordSource, FixedWordSource, WordSource, WordsError};
}
