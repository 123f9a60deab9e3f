//! End-to-end tests over real TCP connections.
//!
//! Each test binds a server on an ephemeral port and speaks the wire
//! protocol with plain `TcpStream`s, stepping through the conversation the
//! way a scripted pair of clients would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use chat_relay::{
    recv_frame, send_frame, ChatError, Registry, Server, ShutdownToken, NO_OTHERS_ONLINE,
};

const STEP_TIMEOUT: Duration = Duration::from_secs(3);

struct TestServer {
    addr: SocketAddr,
    registry: Arc<Registry>,
    token: ShutdownToken,
    run: JoinHandle<Result<(), ChatError>>,
}

async fn start_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = Server::new(listener);
    let registry = server.registry();
    let token = server.shutdown_token();
    let run = tokio::spawn(server.run());

    TestServer {
        addr,
        registry,
        token,
        run,
    }
}

impl TestServer {
    /// Trigger shutdown and wait for the drain to finish.
    async fn shut_down(self) -> Arc<Registry> {
        self.token.trigger();
        timeout(STEP_TIMEOUT, self.run)
            .await
            .expect("server did not drain in time")
            .expect("server task panicked")
            .expect("server returned error");
        self.registry
    }
}

struct Chatter {
    stream: TcpStream,
}

impl Chatter {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        Self { stream }
    }

    /// Connect, send the handshake name, and return together with the
    /// roster reply.
    async fn join(addr: SocketAddr, name: &str) -> (Self, String) {
        let mut chatter = Self::connect(addr).await;
        chatter.send(name.as_bytes()).await;
        let roster = chatter.recv_text().await;
        (chatter, roster)
    }

    async fn send(&mut self, payload: &[u8]) {
        send_frame(&mut self.stream, payload).await.expect("send");
    }

    async fn recv_text(&mut self) -> String {
        let payload = timeout(STEP_TIMEOUT, recv_frame(&mut self.stream))
            .await
            .expect("timed out waiting for frame")
            .expect("recv frame");
        String::from_utf8_lossy(&payload).into_owned()
    }

    /// The connection should deliver nothing further before closing.
    async fn expect_eof(&mut self) {
        let result = timeout(STEP_TIMEOUT, recv_frame(&mut self.stream))
            .await
            .expect("timed out waiting for close");
        assert!(matches!(result, Err(ChatError::PeerClosed)));
    }

    /// No frame should arrive within the grace period.
    async fn expect_silence(&mut self, grace: Duration) {
        let result = timeout(grace, recv_frame(&mut self.stream)).await;
        assert!(result.is_err(), "unexpected frame: {:?}", result);
    }
}

#[tokio::test]
async fn two_clients_full_session() {
    let server = start_server().await;

    // Alice is alone; Bob's roster names her and not himself.
    let (mut alice, alice_roster) = Chatter::join(server.addr, "alice").await;
    assert_eq!(alice_roster, NO_OTHERS_ONLINE);

    let (mut bob, bob_roster) = Chatter::join(server.addr, "bob").await;
    assert!(bob_roster.contains("alice"));
    assert!(!bob_roster.contains("bob"));

    // The join notice reaches everyone, Bob included.
    assert_eq!(alice.recv_text().await, "[Server] bob joined the chat");
    assert_eq!(bob.recv_text().await, "[Server] bob joined the chat");

    // A chat message echoes back to its sender as well.
    alice.send(b"hi").await;
    assert_eq!(alice.recv_text().await, "[alice] hi");
    assert_eq!(bob.recv_text().await, "[alice] hi");

    // Bob drops without the sentinel; Alice sees the departure and is the
    // only client left.
    drop(bob);
    assert_eq!(alice.recv_text().await, "[Server] bob left the chat");
    assert_eq!(server.registry.len().await, 1);

    // Shutdown: Alice is notified, then her connection closes, and the
    // registry drains completely.
    server.token.trigger();
    assert_eq!(alice.recv_text().await, "[Server] server is shutting down");
    alice.expect_eof().await;

    let registry = server.shut_down().await;
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn quit_sentinel_is_not_broadcast() {
    let server = start_server().await;

    let (mut alice, _) = Chatter::join(server.addr, "alice").await;
    let (mut bob, _) = Chatter::join(server.addr, "bob").await;
    assert_eq!(alice.recv_text().await, "[Server] bob joined the chat");
    assert_eq!(bob.recv_text().await, "[Server] bob joined the chat");

    bob.send(b"__quit__").await;

    // Alice sees the departure, never the sentinel itself.
    assert_eq!(alice.recv_text().await, "[Server] bob left the chat");
    assert_eq!(server.registry.len().await, 1);

    server.shut_down().await;
}

#[tokio::test]
async fn empty_name_defaults_to_anonymous() {
    let server = start_server().await;

    let (mut alice, _) = Chatter::join(server.addr, "alice").await;

    let mut nameless = Chatter::connect(server.addr).await;
    nameless.send(b"").await;
    let roster = nameless.recv_text().await;
    assert_eq!(roster, "alice");

    assert_eq!(
        alice.recv_text().await,
        "[Server] anonymous joined the chat"
    );

    server.shut_down().await;
}

#[tokio::test]
async fn failed_handshake_is_silent() {
    let server = start_server().await;

    let (mut alice, _) = Chatter::join(server.addr, "alice").await;

    // A connection that dies before sending a name is cleaned up without
    // any announcement.
    let ghost = Chatter::connect(server.addr).await;
    drop(ghost);

    alice.expect_silence(Duration::from_millis(300)).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(server.registry.len().await, 1);

    // The accept loop is unaffected: a real client can still join.
    let (_bob, bob_roster) = Chatter::join(server.addr, "bob").await;
    assert_eq!(bob_roster, "alice");
    assert_eq!(alice.recv_text().await, "[Server] bob joined the chat");

    server.shut_down().await;
}

#[tokio::test]
async fn shutdown_drains_every_connection() {
    let server = start_server().await;

    let (mut alice, _) = Chatter::join(server.addr, "alice").await;
    let (mut bob, _) = Chatter::join(server.addr, "bob").await;
    assert_eq!(alice.recv_text().await, "[Server] bob joined the chat");
    assert_eq!(bob.recv_text().await, "[Server] bob joined the chat");

    server.token.trigger();

    assert_eq!(alice.recv_text().await, "[Server] server is shutting down");
    assert_eq!(bob.recv_text().await, "[Server] server is shutting down");
    alice.expect_eof().await;
    bob.expect_eof().await;

    let registry = server.shut_down().await;
    assert!(registry.is_empty().await);
}
