//! Per-connection handler: framing, dispatch, and replies.
//!
//! Each accepted session socket gets its own task running this handler.
//! The task reads exactly one framed request at a time and fully handles
//! it — reply written — before reading the next, which is what gives a
//! single session its strict request ordering. A match request parks the
//! task inside the duel until it settles; the session socket stays quiet
//! for exactly that long.

use std::net::IpAddr;
use std::sync::Arc;

use quizzle_match::{DuelConfig, DuelSetup, InviteOutcome, MatchOrchestrator};
use quizzle_presence::ConnId;
use quizzle_protocol::Request;
use quizzle_store::{FriendshipOutcome, UserRecord};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;

use crate::server::ServerState;
use crate::ServerError;

/// What the session loop should do after a request.
enum Flow {
    Continue,
    Close,
}

/// Drop guard that takes a connection's user offline when the handler
/// exits. The normal paths unbind explicitly before the socket closes;
/// this covers panics. Since `Drop` is synchronous, it spawns a
/// fire-and-forget task for the async lock.
struct PresenceGuard {
    conn_id: ConnId,
    state: Arc<ServerState>,
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.presence.lock().await.unbind(conn_id);
        });
    }
}

/// Handles a single session connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    conn_id: ConnId,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let peer = stream.peer_addr()?;
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let _guard = PresenceGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // Peer closed (or crashed): presence cleanup before the
                // socket close becomes observable, no reply.
                brutal_logout(&state, conn_id).await;
                break;
            }
            Err(error) => {
                tracing::debug!(%conn_id, %error, "session read failed");
                brutal_logout(&state, conn_id).await;
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let request = match Request::parse(&line) {
            Ok(request) => request,
            Err(error) => {
                tracing::debug!(%conn_id, %error, "ignoring malformed request");
                continue;
            }
        };

        match dispatch(request, conn_id, peer.ip(), &state, &mut writer).await? {
            Flow::Continue => {}
            Flow::Close => break,
        }
    }

    Ok(())
}

/// Routes one parsed request to its handler and writes the reply.
async fn dispatch(
    request: Request,
    conn_id: ConnId,
    peer_ip: IpAddr,
    state: &ServerState,
    writer: &mut OwnedWriteHalf,
) -> Result<Flow, ServerError> {
    match request {
        Request::Login {
            nickname,
            password,
            udp_port,
        } => {
            let reply = login(state, conn_id, peer_ip, &nickname, &password, udp_port).await;
            write_line(writer, &reply).await?;
        }
        Request::Logout => {
            if let Some(nickname) = state.presence.lock().await.unbind(conn_id) {
                tracing::info!(%conn_id, %nickname, "logged out");
            }
            write_line(writer, "Logout successful").await?;
            return Ok(Flow::Close);
        }
        Request::AddFriend { nickname } => {
            let reply = add_friend(state, conn_id, &nickname).await;
            write_line(writer, &reply).await?;
        }
        Request::FriendList => {
            let reply = friend_list(state, conn_id).await;
            write_line(writer, &reply).await?;
        }
        Request::Score => {
            let reply = score(state, conn_id).await;
            write_line(writer, &reply).await?;
        }
        Request::Scoreboard => {
            let reply = scoreboard(state, conn_id).await;
            write_line(writer, &reply).await?;
        }
        Request::Match { nickname } => {
            handle_match(state, conn_id, peer_ip, nickname, writer).await?;
        }
    }
    Ok(Flow::Continue)
}

/// Presence cleanup for a crashed peer. No reply goes out.
async fn brutal_logout(state: &ServerState, conn_id: ConnId) {
    if let Some(nickname) = state.presence.lock().await.unbind(conn_id) {
        tracing::info!(%conn_id, %nickname, "brutal logout after peer crash");
    }
}

/// The nickname logged in on this connection, if any.
async fn logged_nickname(state: &ServerState, conn_id: ConnId) -> Option<String> {
    state
        .presence
        .lock()
        .await
        .nickname_of(conn_id)
        .map(str::to_string)
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<(), ServerError> {
    writer.write_all(format!("{line}\n").as_bytes()).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Request handlers
// ---------------------------------------------------------------------------

async fn login(
    state: &ServerState,
    conn_id: ConnId,
    peer_ip: IpAddr,
    nickname: &str,
    password: &str,
    udp_port: u16,
) -> String {
    if state.store.lookup(nickname).is_none() {
        return format!("Login error: user {nickname} not found. Please register.");
    }

    // One lock scope: the busy checks and the bind must be atomic, or
    // two racing logins could both pass the checks.
    let mut presence = state.presence.lock().await;
    if presence.is_online(nickname) {
        return format!("Login error: {nickname} is already logged in.");
    }
    if presence.nickname_of(conn_id).is_some() {
        return "Login error: you are already logged with another account.".to_string();
    }
    if !state.store.verify(nickname, password) {
        return "Login error: wrong password.".to_string();
    }

    let endpoint = std::net::SocketAddr::new(peer_ip, udp_port);
    match presence.bind(conn_id, nickname, endpoint) {
        Ok(()) => "Login successful.".to_string(),
        // Unreachable after the checks above, but never panic a handler.
        Err(error) => format!("Login error: {error}."),
    }
}

async fn add_friend(state: &ServerState, conn_id: ConnId, friend: &str) -> String {
    let Some(nickname) = logged_nickname(state, conn_id).await else {
        return "Add friend error: you are not logged in.".to_string();
    };
    if state.store.lookup(friend).is_none() {
        return format!("Add friend error: user {friend} not found.");
    }
    if nickname == friend {
        return "Add friend error: you cannot add yourself as a friend.".to_string();
    }
    match state.store.add_friendship(&nickname, friend) {
        Ok(FriendshipOutcome::Added) => format!("{friend} is now your friend."),
        Ok(FriendshipOutcome::AlreadyFriends) => {
            format!("Add friend error: you and {friend} are already friends.")
        }
        Err(error) => {
            tracing::warn!(%nickname, %friend, %error, "add friend failed");
            format!("Add friend error: user {friend} not found.")
        }
    }
}

async fn friend_list(state: &ServerState, conn_id: ConnId) -> String {
    let Some(nickname) = logged_nickname(state, conn_id).await else {
        return "Friend list error: you are not logged in.".to_string();
    };
    match state.store.lookup(&nickname) {
        Some(user) if user.friends.is_empty() => {
            "You currently have no friends, add some!".to_string()
        }
        Some(user) => {
            let mut reply = String::from("Your friends are: ");
            for friend in &user.friends {
                reply.push_str(friend);
                reply.push(' ');
            }
            reply
        }
        None => "Friend list error: you are not logged in.".to_string(),
    }
}

async fn score(state: &ServerState, conn_id: ConnId) -> String {
    let Some(nickname) = logged_nickname(state, conn_id).await else {
        return "Score error: you are not logged in.".to_string();
    };
    match state.store.lookup(&nickname) {
        Some(user) => format!("{nickname}, your score is: {}", user.score),
        None => "Score error: you are not logged in.".to_string(),
    }
}

async fn scoreboard(state: &ServerState, conn_id: ConnId) -> String {
    let Some(nickname) = logged_nickname(state, conn_id).await else {
        return "Scoreboard error: you are not logged in.".to_string();
    };
    let Some(user) = state.store.lookup(&nickname) else {
        return "Scoreboard error: you are not logged in.".to_string();
    };

    let mut board: Vec<UserRecord> = user
        .friends
        .iter()
        .filter_map(|friend| state.store.lookup(friend))
        .collect();
    board.push(user);
    // Stable: equal scores keep their relative order.
    board.sort_by(|a, b| b.score.cmp(&a.score));

    let mut reply = String::new();
    for entry in &board {
        reply.push_str(&entry.nickname);
        reply.push(' ');
        reply.push_str(&entry.score.to_string());
        reply.push(' ');
    }
    reply
}

/// The match opcode: preflight, invitation, then the duel itself.
async fn handle_match(
    state: &ServerState,
    conn_id: ConnId,
    peer_ip: IpAddr,
    friend: String,
    writer: &mut OwnedWriteHalf,
) -> Result<(), ServerError> {
    let Some(nickname) = logged_nickname(state, conn_id).await else {
        return write_line(writer, "Match error: you are not logged in.").await;
    };
    if nickname == friend {
        return write_line(writer, "Match error: you cannot challenge yourself.").await;
    }
    let are_friends = state
        .store
        .lookup(&nickname)
        .is_some_and(|user| user.is_friend(&friend));
    if !are_friends {
        return write_line(
            writer,
            &format!("Match error: user {friend} and you are not friends."),
        )
        .await;
    }
    let Some(challenged_endpoint) = state.presence.lock().await.endpoint_of(&friend) else {
        return write_line(writer, &format!("Match error: {friend} is offline")).await;
    };

    let setup = DuelSetup {
        challenger: nickname.clone(),
        challenged: friend.clone(),
        challenger_ip: peer_ip,
        challenged_ip: challenged_endpoint.ip(),
        challenged_endpoint,
    };
    let config = DuelConfig {
        duration: state.config.match_duration,
        invite_window: state.config.invite_window,
        word_count: state.config.match_words,
    };

    let phase = async {
        let orchestrator = MatchOrchestrator::prepare(setup, config).await?;
        let outcome = orchestrator.invite().await?;
        Ok::<_, quizzle_match::MatchError>((orchestrator, outcome))
    };
    let (orchestrator, outcome) = match phase.await {
        Ok(pair) => pair,
        Err(error) => {
            tracing::warn!(challenger = %nickname, challenged = %friend, %error, "could not start duel");
            return write_line(writer, "Match error: could not start the match.").await;
        }
    };

    match outcome {
        InviteOutcome::Refused => {
            write_line(writer, &format!("{friend} refused your match invitation.")).await
        }
        InviteOutcome::TimedOut => {
            write_line(
                writer,
                &format!("Match error: invitation to {friend} timed out."),
            )
            .await
        }
        InviteOutcome::Accepted => {
            write_line(
                writer,
                &format!(
                    "{friend} accepted your match invitation./{}",
                    orchestrator.duel_port()
                ),
            )
            .await?;
            tracing::info!(challenger = %nickname, challenged = %friend, "duel starting");
            // The session stays parked here until the duel settles.
            if let Err(error) = orchestrator.run(&state.store, state.words.as_ref()).await {
                tracing::warn!(challenger = %nickname, challenged = %friend, %error, "duel aborted");
            }
            Ok(())
        }
    }
}
