//! Authoritative server.
//!
//! The server owns the one true [`GameState`]. Clients send commands; every
//! accepted command produces a new full snapshot that is broadcast to all
//! connected clients, including the sender. New clients receive the current
//! snapshot as soon as they connect.

use crate::constants::BROADCAST_CAPACITY;
use crate::protocol::{decode_command, encode_line, GameState, ProtocolMessage};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

/// Identifier assigned to each connection, used in logs.
pub type ClientId = Uuid;

/// Game state plus the rules for changing it.
#[derive(Debug, Clone)]
pub struct GameServer {
    state: GameState,
}

impl GameServer {
    /// Creates a server holding `state`.
    pub fn new(state: GameState) -> Self {
        Self { state }
    }

    /// Current authoritative state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Applies a client command.
    ///
    /// # Returns
    ///
    /// `true` if the state changed and a new snapshot should go out.
    pub fn apply(&mut self, message: ProtocolMessage) -> bool {
        match message {
            ProtocolMessage::MovePiece { name, destination } => {
                if self.state.move_piece(&name, &destination) {
                    info!("Moved {} to {}", name, destination);
                    true
                } else {
                    warn!("Ignoring move of unknown piece {}", name);
                    false
                }
            }
        }
    }

    /// The current state as one wire line.
    fn snapshot_line(&self) -> Result<Arc<str>, serde_json::Error> {
        Ok(Arc::from(encode_line(self.state.document())?))
    }
}

/// Binds `bind_addr` and serves `state` until the listener fails.
pub async fn serve(bind_addr: &str, state: GameState) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Serving game on {}", listener.local_addr()?);
    run_server(listener, GameServer::new(state)).await
}

/// Accepts clients on `listener`, one task per connection.
pub async fn run_server(listener: TcpListener, server: GameServer) -> std::io::Result<()> {
    let server = Arc::new(Mutex::new(server));
    let (snapshots, _) = broadcast::channel::<Arc<str>>(BROADCAST_CAPACITY);

    loop {
        let (stream, peer) = listener.accept().await?;
        let client_id: ClientId = Uuid::new_v4();
        info!("Client {} connected from {}", client_id, peer);

        let server = Arc::clone(&server);
        let snapshots = snapshots.clone();
        tokio::spawn(async move {
            match handle_client(client_id, stream, server, snapshots).await {
                Ok(()) => info!("Client {} disconnected", client_id),
                Err(e) => warn!("Client {} dropped: {}", client_id, e),
            }
        });
    }
}

/// Current snapshot line, read under the lock.
fn current_snapshot(server: &Mutex<GameServer>) -> std::io::Result<Arc<str>> {
    let server = server.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(server.snapshot_line()?)
}

async fn handle_client(
    client_id: ClientId,
    stream: TcpStream,
    server: Arc<Mutex<GameServer>>,
    snapshots: broadcast::Sender<Arc<str>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    // Subscribe before reading the snapshot so no update falls in between
    let mut updates = snapshots.subscribe();

    let initial = current_snapshot(&server)?;
    write_half.write_all(initial.as_bytes()).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                let message = match decode_command(&line) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Client {} sent an unknown or malformed command: {}", client_id, e);
                        continue;
                    }
                };
                debug!("Client {} sent {:?}", client_id, message);
                let snapshot = {
                    let mut server = server.lock().unwrap_or_else(PoisonError::into_inner);
                    if server.apply(message) {
                        Some(server.snapshot_line()?)
                    } else {
                        None
                    }
                };
                if let Some(snapshot) = snapshot {
                    let _ = snapshots.send(snapshot);
                }
            }
            update = updates.recv() => {
                let snapshot = match update {
                    Ok(snapshot) => snapshot,
                    Err(RecvError::Lagged(skipped)) => {
                        // Snapshots are complete, so the latest one is enough
                        debug!("Client {} lagged by {} snapshots", client_id, skipped);
                        current_snapshot(&server)?
                    }
                    Err(RecvError::Closed) => return Ok(()),
                };
                write_half.write_all(snapshot.as_bytes()).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SyncChannel;
    use crate::net::client::run_client;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn state() -> GameState {
        GameState::from_value(json!({
            "game_board": {"pieces": [
                {"name": "p1", "location": "L1"},
                {"name": "p2", "location": "L1"}
            ]},
            "turn": "red"
        }))
        .unwrap()
    }

    /// Services the channel until a message arrives or two seconds pass.
    async fn next_inbound(channel: &mut SyncChannel) -> Value {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                channel.service_channel();
                if let Some(value) = channel.receive() {
                    return value;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("no inbound message within timeout")
    }

    #[test]
    fn test_apply_moves_known_pieces_only() {
        let mut server = GameServer::new(state());
        assert!(server.apply(ProtocolMessage::MovePiece {
            name: "p2".into(),
            destination: "L7".into()
        }));
        assert_eq!(server.state().pieces()[1].location, "L7");
        assert!(!server.apply(ProtocolMessage::MovePiece {
            name: "nobody".into(),
            destination: "L7".into()
        }));
        assert_eq!(server.state().document()["turn"], "red");
    }

    #[tokio::test]
    async fn test_client_receives_snapshot_and_broadcasts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(run_server(listener, GameServer::new(state())));

        let (mut alice, alice_end) = SyncChannel::new();
        let (mut bob, bob_end) = SyncChannel::new();
        tokio::spawn(run_client(addr.clone(), alice_end));
        tokio::spawn(run_client(addr, bob_end));

        let initial = next_inbound(&mut alice).await;
        assert_eq!(initial["game_board"]["pieces"][0]["location"], "L1");
        assert_eq!(initial["turn"], "red");
        let _ = next_inbound(&mut bob).await;

        alice.send(ProtocolMessage::MovePiece {
            name: "p1".into(),
            destination: "L2".into(),
        });
        alice.service_channel();
        let update = next_inbound(&mut bob).await;
        assert_eq!(update["game_board"]["pieces"][0]["location"], "L2");
        let echoed = next_inbound(&mut alice).await;
        assert_eq!(echoed, update);
    }

    #[tokio::test]
    async fn test_unknown_commands_are_ignored() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(run_server(listener, GameServer::new(state())));

        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let first = lines.next_line().await.unwrap().unwrap();
        assert!(first.contains("\"L1\""));

        write_half
            .write_all(b"{\"command\":\"roll_dice\"}\nnot json\n")
            .await
            .unwrap();
        write_half
            .write_all(b"{\"command\":\"move_piece\",\"name\":\"p2\",\"destination\":\"L3\"}\n")
            .await
            .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&next).unwrap();
        assert_eq!(value["game_board"]["pieces"][1]["location"], "L3");
    }
}
