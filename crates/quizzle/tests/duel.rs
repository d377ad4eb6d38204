//! Integration tests for the full match flow over a live server:
//! invitation over UDP, duel over the ephemeral listener, scoring,
//! persistence, refusal, and invitation timeout.

use std::net::SocketAddr;
use std::time::Duration;

use quizzle::{QuizzleServer, ServerConfig};
use quizzle_protocol::Invitation;
use quizzle_store::UserStore;
use quizzle_words::{Challenge, FixedWordSource};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, UdpSocket};

// =========================================================================
// Harness
// =========================================================================

async fn spawn_server(tag: &str, invite_window: Duration) -> (SocketAddr, SocketAddr) {
    let mut path = std::env::temp_dir();
    path.push(format!("quizzle-duel-it-{tag}-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let store = UserStore::open(path).unwrap();

    // Deterministic two-word batch: casa then cane.
    let words = FixedWordSource::new(vec![
        Challenge::new("casa", &["house", "home"]),
        Challenge::new("cane", &["dog"]),
    ]);

    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        registration_addr: "127.0.0.1:0".to_string(),
        match_duration: Duration::from_secs(10),
        invite_window,
        match_words: 2,
    };

    let server = QuizzleServer::builder()
        .config(config)
        .build(store, words)
        .await
        .unwrap();
    let session = server.session_addr().unwrap();
    let registration = server.registration_addr().unwrap();
    tokio::spawn(server.run());
    (session, registration)
}

struct Session {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Session {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        self.lines.next_line().await.unwrap().expect("a reply line")
    }

    async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await
    }
}

async fn register(addr: SocketAddr, nickname: &str) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, mut writer) = stream.into_split();
    writer
        .write_all(format!("{nickname} pw\n").as_bytes())
        .await
        .unwrap();
    let status = BufReader::new(read_half)
        .lines()
        .next_line()
        .await
        .unwrap()
        .expect("a status line");
    assert_eq!(status, "Registration succeeded");
}

async fn recv_datagram(socket: &UdpSocket) -> (String, SocketAddr) {
    let mut buf = [0u8; 64];
    let (len, from) = socket.recv_from(&mut buf).await.unwrap();
    (String::from_utf8_lossy(&buf[..len]).into_owned(), from)
}

/// Plays one side of a duel to completion and returns the `END/` line.
async fn play_duel(port: u16, nickname: &str, answers: &[&str]) -> String {
    let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    writer
        .write_all(format!("START/{nickname}\n").as_bytes())
        .await
        .unwrap();

    for answer in answers {
        let word = lines.next_line().await.unwrap().expect("a word line");
        assert!(!word.starts_with("END/"), "ran out of words early: {word}");
        writer
            .write_all(format!("{answer}/{nickname}\n").as_bytes())
            .await
            .unwrap();
    }

    lines.next_line().await.unwrap().expect("the END line")
}

/// Registers alice and bob, logs them in (bob on a real UDP socket), and
/// makes them friends. Returns both sessions and bob's UDP socket.
async fn befriended_pair(
    session_addr: SocketAddr,
    registration_addr: SocketAddr,
) -> (Session, Session, UdpSocket) {
    register(registration_addr, "alice").await;
    register(registration_addr, "bob").await;

    let bob_udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let bob_udp_port = bob_udp.local_addr().unwrap().port();

    let mut alice = Session::connect(session_addr).await;
    assert_eq!(alice.request("0 alice pw 7001").await, "Login successful.");
    let mut bob = Session::connect(session_addr).await;
    assert_eq!(
        bob.request(&format!("0 bob pw {bob_udp_port}")).await,
        "Login successful."
    );
    assert_eq!(alice.request("2 bob").await, "bob is now your friend.");

    (alice, bob, bob_udp)
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_full_duel_over_the_server() {
    let (session_addr, registration_addr) =
        spawn_server("full", Duration::from_secs(5)).await;
    let (mut alice, mut bob, bob_udp) = befriended_pair(session_addr, registration_addr).await;

    alice.send("6 bob").await;

    // bob's client receives the invitation and accepts.
    let (payload, from) = recv_datagram(&bob_udp).await;
    let invitation = Invitation::parse(&payload).unwrap();
    assert_eq!(invitation.challenger, "alice");
    bob_udp.send_to(b"Y", from).await.unwrap();

    // alice learns the duel port from her session socket.
    let accept = alice.recv().await;
    let (text, port) = accept.rsplit_once('/').unwrap();
    assert_eq!(text, "bob accepted your match invitation.");
    let duel_port: u16 = port.parse().unwrap();
    assert_eq!(duel_port, invitation.duel_port);

    // Both clients race through the batch.
    let (alice_end, bob_end) = tokio::join!(
        play_duel(duel_port, "alice", &["house", "dog"]),
        play_duel(duel_port, "bob", &["house", "cat"]),
    );
    assert_eq!(alice_end, "END/You have scored: 7 points. You won.");
    assert_eq!(bob_end, "END/You have scored: 1 points. You lost.");

    // Scores persisted and visible over the session channel again.
    assert_eq!(alice.request("4").await, "alice, your score is: 7");
    assert_eq!(bob.request("4").await, "bob, your score is: 1");
    // Distinct scores make the scoreboard order deterministic.
    assert_eq!(alice.request("5").await, "alice 7 bob 1 ");
}

#[tokio::test]
async fn test_refused_invitation_reaches_challenger() {
    let (session_addr, registration_addr) =
        spawn_server("refused", Duration::from_secs(5)).await;
    let (mut alice, _bob, bob_udp) = befriended_pair(session_addr, registration_addr).await;

    alice.send("6 bob").await;

    let (_, from) = recv_datagram(&bob_udp).await;
    bob_udp.send_to(b"N", from).await.unwrap();

    assert_eq!(alice.recv().await, "bob refused your match invitation.");
    // The session is still usable.
    assert_eq!(alice.request("4").await, "alice, your score is: 0");
}

#[tokio::test]
async fn test_silent_invitation_times_out_and_notifies_peer() {
    let (session_addr, registration_addr) =
        spawn_server("timeout", Duration::from_secs(1)).await;
    let (mut alice, _bob, bob_udp) = befriended_pair(session_addr, registration_addr).await;

    alice.send("6 bob").await;

    // bob's client sees the invitation but stays silent.
    let (payload, _) = recv_datagram(&bob_udp).await;
    assert!(Invitation::parse(&payload).is_ok());

    // After the window, alice gets the error...
    assert_eq!(
        alice.recv().await,
        "Match error: invitation to bob timed out."
    );
    // ...and bob gets the eviction notice for his pending-invite table.
    let (notice, _) = recv_datagram(&bob_udp).await;
    assert_eq!(notice, "TIMEOUT/alice");
}

#[tokio::test]
async fn test_crash_mid_duel_scores_remaining_answers_blank() {
    let (session_addr, registration_addr) =
        spawn_server("crash", Duration::from_secs(5)).await;
    let (mut alice, mut bob, bob_udp) = befriended_pair(session_addr, registration_addr).await;

    alice.send("6 bob").await;
    let (_, from) = recv_datagram(&bob_udp).await;
    bob_udp.send_to(b"Y", from).await.unwrap();

    let accept = alice.recv().await;
    let duel_port: u16 = accept.rsplit_once('/').unwrap().1.parse().unwrap();

    // bob's duel socket dies after the first word arrives.
    let crashing_bob = async {
        let stream = TcpStream::connect(("127.0.0.1", duel_port)).await.unwrap();
        let (read_half, mut writer) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        writer.write_all(b"START/bob\n").await.unwrap();
        let _word = lines.next_line().await.unwrap();
    };

    let (alice_end, _) = tokio::join!(
        play_duel(duel_port, "alice", &["house", "dog"]),
        crashing_bob,
    );
    assert_eq!(alice_end, "END/You have scored: 7 points. You won.");

    // bob's session socket survived his duel crash; both deltas persisted.
    assert_eq!(alice.request("4").await, "alice, your score is: 7");
    assert_eq!(bob.request("4").await, "bob, your score is: 0");
}
