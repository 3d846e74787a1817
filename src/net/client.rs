//! Client side of the transport.

use crate::channel::TransportEnd;
use crate::constants::RECONNECT_DELAY;
use crate::protocol::{encode_line, ProtocolMessage};
use log::{info, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Why a connection stopped pumping.
enum PumpEnd {
    /// The session dropped its channel; stop for good
    SessionClosed,
    /// The server hung up; try again later
    ServerClosed,
}

/// Connects to `addr` and shuttles messages between the socket and the
/// session's channel until the session goes away.
///
/// Connection failures are logged and retried every
/// [`RECONNECT_DELAY`]; commands queued while disconnected are sent once a
/// connection is back.
pub async fn run_client(addr: String, transport: TransportEnd) {
    let TransportEnd {
        mut outbound,
        inbound,
    } = transport;

    loop {
        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                info!("Connected to {}", addr);
                match pump(stream, &mut outbound, &inbound).await {
                    Ok(PumpEnd::SessionClosed) => {
                        info!("Session closed; disconnecting from {}", addr);
                        return;
                    }
                    Ok(PumpEnd::ServerClosed) => info!("Server {} closed the connection", addr),
                    Err(e) => warn!("Connection to {} failed: {}", addr, e),
                }
            }
            Err(e) => warn!("Could not connect to {}: {}", addr, e),
        }

        if inbound.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Moves messages in both directions over one connection.
async fn pump(
    stream: TcpStream,
    outbound: &mut UnboundedReceiver<ProtocolMessage>,
    inbound: &UnboundedSender<Value>,
) -> std::io::Result<PumpEnd> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(message) = message else {
                    return Ok(PumpEnd::SessionClosed);
                };
                let line = encode_line(&message)?;
                write_half.write_all(line.as_bytes()).await?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(PumpEnd::ServerClosed);
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(&line) {
                    Ok(value) => {
                        if inbound.send(value).is_err() {
                            return Ok(PumpEnd::SessionClosed);
                        }
                    }
                    Err(e) => warn!("Discarding undecodable line from server: {}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SyncChannel;
    use crate::protocol::decode_command;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_commands_queued_before_server_starts_are_delivered() {
        // Reserve a free port, then release it so the first connect fails
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let (mut channel, transport) = SyncChannel::new();
        tokio::spawn(run_client(addr.to_string(), transport));

        channel.send(ProtocolMessage::MovePiece {
            name: "p1".into(),
            destination: "L2".into(),
        });
        channel.service_channel();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let listener = TcpListener::bind(addr).await.unwrap();
        let timeout = RECONNECT_DELAY * 3;
        let (stream, _) = tokio::time::timeout(timeout, listener.accept())
            .await
            .expect("client did not reconnect")
            .unwrap();
        let mut lines = BufReader::new(stream).lines();
        let line = tokio::time::timeout(timeout, lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(
            decode_command(&line).unwrap(),
            ProtocolMessage::MovePiece {
                name: "p1".into(),
                destination: "L2".into()
            }
        );
        assert!(!channel.is_disconnected());
    }
}
