//! The registration front door.
//!
//! A deliberately tiny remote procedure: connect, send one line of
//! `<nickname> <password>`, read one status line, done. Runs on its own
//! port so clients can register before they have any session.

use std::sync::Arc;

use quizzle_store::RegisterOutcome;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::server::ServerState;

/// Accept loop for registration connections.
pub(crate) async fn run_registration(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tracing::debug!(%addr, "registration connection");
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(error) = handle_registration(stream, state).await {
                        tracing::debug!(%addr, %error, "registration exchange failed");
                    }
                });
            }
            Err(error) => {
                tracing::error!(%error, "registration accept failed");
            }
        }
    }
}

/// One request, one status line, close.
async fn handle_registration(stream: TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let Some(line) = lines.next_line().await? else {
        return Ok(());
    };
    let reply = register_reply(&state, &line);
    writer.write_all(format!("{reply}\n").as_bytes()).await?;
    writer.shutdown().await
}

fn register_reply(state: &ServerState, line: &str) -> &'static str {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next()) {
        (None, _) => "Invalid username",
        (Some(_), None) => "Invalid password",
        (Some(nickname), Some(password)) => match state.store.register(nickname, password) {
            RegisterOutcome::Created => "Registration succeeded",
            RegisterOutcome::AlreadyExists => "Nickname already taken.",
        },
    }
}
