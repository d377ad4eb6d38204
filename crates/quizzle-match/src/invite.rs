//! Phase one: the UDP invitation round trip.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use quizzle_protocol::{timeout_notice, Invitation, InviteReply};
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// How the invitation phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteOutcome {
    /// The challenged player sent `Y`; both sides now head for the duel
    /// listener.
    Accepted,
    /// The challenged player sent `N`.
    Refused,
    /// No reply within the window. The challenged side has been told to
    /// evict its pending invite.
    TimedOut,
}

/// Sends `"<challenger>/<duel_port>"` to the challenged player's
/// registered endpoint and waits up to `window` for the one-byte reply.
///
/// Datagrams that parse as neither `Y` nor `N` are ignored; the window
/// keeps running. On expiry a `TIMEOUT/<challenger>` notice is sent to
/// the same endpoint so the peer can drop the stale invite.
pub(crate) async fn send_invitation(
    challenger: &str,
    duel_port: u16,
    challenged_endpoint: SocketAddr,
    window: Duration,
) -> io::Result<InviteOutcome> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;

    let invitation = Invitation {
        challenger: challenger.to_string(),
        duel_port,
    };
    socket
        .send_to(invitation.encode().as_bytes(), challenged_endpoint)
        .await?;
    tracing::debug!(
        %challenger,
        endpoint = %challenged_endpoint,
        duel_port,
        "invitation sent"
    );

    let reply = timeout(window, await_reply(&socket)).await;
    match reply {
        Ok(reply) => reply.map(|reply| match reply {
            InviteReply::Accept => InviteOutcome::Accepted,
            InviteReply::Refuse => InviteOutcome::Refused,
        }),
        Err(_elapsed) => {
            socket
                .send_to(timeout_notice(challenger).as_bytes(), challenged_endpoint)
                .await?;
            Ok(InviteOutcome::TimedOut)
        }
    }
}

/// Receives datagrams until one parses as an invitation reply.
async fn await_reply(socket: &UdpSocket) -> io::Result<InviteReply> {
    let mut buf = [0u8; 16];
    loop {
        let (len, from) = socket.recv_from(&mut buf).await?;
        let payload = String::from_utf8_lossy(&buf[..len]);
        match InviteReply::parse(&payload) {
            Ok(reply) => return Ok(reply),
            Err(error) => {
                tracing::debug!(%from, %error, "ignoring stray datagram");
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
