//! Error types for the store layer.

/// Errors that can occur in the user store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the persisted image failed at startup.
    #[error("cannot read store file: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted image exists but is not valid JSON for the schema.
    #[error("store file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An operation referenced a nickname that is not registered.
    #[error("user {0} not found")]
    UnknownUser(String),

    /// A user tried to befriend themself.
    #[error("a user cannot be their own friend")]
    SelfFriendship,
}
