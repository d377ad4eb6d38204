//! `QuizzleServer` builder and accept loop.
//!
//! This is the entry point for running a Word Quizzle server. It ties
//! together all the layers: framing → handlers → store/presence → match.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quizzle_presence::{ConnId, PresenceRegistry};
use quizzle_store::UserStore;
use quizzle_words::WordSource;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::registration::run_registration;
use crate::{ServerConfig, ServerError};

/// Counter for allocating connection identities at accept time.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The store
/// synchronizes itself; the presence registry sits behind one mutex so
/// its compound bind/unbind operations stay atomic.
pub(crate) struct ServerState {
    pub(crate) store: UserStore,
    pub(crate) presence: Mutex<PresenceRegistry>,
    pub(crate) words: Box<dyn WordSource>,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Word Quizzle server.
///
/// # Example
///
/// ```rust,ignore
/// let server = QuizzleServer::builder()
///     .config(ServerConfig::default())
///     .build(store, words)
///     .await?;
/// server.run().await
/// ```
pub struct QuizzleServerBuilder {
    config: ServerConfig,
}

impl QuizzleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds both listeners and assembles the server.
    ///
    /// # Errors
    /// Rejects a zero `match_words` and surfaces bind failures.
    pub async fn build(
        self,
        store: UserStore,
        words: impl WordSource,
    ) -> Result<QuizzleServer, ServerError> {
        if self.config.match_words == 0 {
            return Err(ServerError::Config(
                "a match needs at least one word".to_string(),
            ));
        }

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let registration = TcpListener::bind(&self.config.registration_addr).await?;
        let session_addr = listener.local_addr()?;
        let registration_addr = registration.local_addr()?;
        tracing::info!(
            session = %session_addr,
            registration = %registration_addr,
            "listeners bound"
        );

        let state = Arc::new(ServerState {
            store,
            presence: Mutex::new(PresenceRegistry::new()),
            words: Box::new(words),
            config: self.config,
        });

        Ok(QuizzleServer {
            listener,
            registration,
            state,
        })
    }
}

impl Default for QuizzleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Word Quizzle server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizzleServer {
    listener: TcpListener,
    registration: TcpListener,
    state: Arc<ServerState>,
}

impl QuizzleServer {
    /// Creates a new builder.
    pub fn builder() -> QuizzleServerBuilder {
        QuizzleServerBuilder::new()
    }

    /// The address the session listener is bound to.
    pub fn session_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The address the registration front door is bound to.
    pub fn registration_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.registration.local_addr()
    }

    /// Runs the accept loops.
    ///
    /// Registration runs in its own task; the session loop accepts
    /// connections, allocates a [`ConnId`] for each, and spawns a handler
    /// task. Runs until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Word Quizzle server running");

        let registration_state = Arc::clone(&self.state);
        tokio::spawn(run_registration(self.registration, registration_state));

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn_id = ConnId::new(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed));
                    tracing::debug!(%conn_id, %addr, "accepted session connection");
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(error) = handle_connection(stream, conn_id, state).await {
                            tracing::debug!(%conn_id, %error, "session ended with error");
                        }
                    });
                }
                Err(error) => {
                    tracing::error!(%error, "accept failed");
                }
            }
        }
    }
}
