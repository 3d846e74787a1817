//! Queue pair between the update loop and the network.
//!
//! The update loop never touches the socket. It pushes outbound commands onto
//! the send queue and pops inbound snapshots from the receive queue; once per
//! tick [`SyncChannel::service_channel`] moves messages between those queues
//! and the transport task through unbounded `tokio` channels. Nothing here
//! blocks.

use crate::protocol::ProtocolMessage;
use log::{debug, warn};
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// The transport's side of a [`SyncChannel`].
#[derive(Debug)]
pub struct TransportEnd {
    /// Commands flushed by the update loop, in enqueue order
    pub outbound: UnboundedReceiver<ProtocolMessage>,
    /// Decoded inbound messages for the update loop
    pub inbound: UnboundedSender<Value>,
}

/// Update-loop side of the client connection.
#[derive(Debug)]
pub struct SyncChannel {
    /// Commands waiting for the next service call
    send_queue: VecDeque<ProtocolMessage>,
    /// Inbound messages waiting for the update loop
    receive_queue: VecDeque<Value>,
    to_transport: UnboundedSender<ProtocolMessage>,
    from_transport: UnboundedReceiver<Value>,
    /// Set once the transport has gone away
    disconnected: bool,
}

impl SyncChannel {
    /// Creates a channel and the matching transport end.
    pub fn new() -> (Self, TransportEnd) {
        let (to_transport, outbound) = mpsc::unbounded_channel();
        let (inbound, from_transport) = mpsc::unbounded_channel();
        let channel = Self {
            send_queue: VecDeque::new(),
            receive_queue: VecDeque::new(),
            to_transport,
            from_transport,
            disconnected: false,
        };
        (channel, TransportEnd { outbound, inbound })
    }

    /// Queues a command. It reaches the transport on the next
    /// [`service_channel`](Self::service_channel) call.
    pub fn send(&mut self, message: ProtocolMessage) {
        self.send_queue.push_back(message);
    }

    /// Moves queued commands to the transport and collects everything the
    /// transport has delivered since the last call. Never blocks.
    pub fn service_channel(&mut self) {
        while let Some(message) = self.send_queue.pop_front() {
            if let Err(mpsc::error::SendError(message)) = self.to_transport.send(message) {
                if !self.disconnected {
                    warn!("Transport is gone; dropping outbound {:?}", message);
                }
                self.disconnected = true;
            }
        }

        loop {
            match self.from_transport.try_recv() {
                Ok(value) => self.receive_queue.push_back(value),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        debug!("Transport closed its inbound side");
                    }
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// Pops the oldest inbound message, if any.
    pub fn receive(&mut self) -> Option<Value> {
        self.receive_queue.pop_front()
    }

    /// Number of commands not yet handed to the transport.
    pub fn pending_outbound(&self) -> usize {
        self.send_queue.len()
    }

    /// Whether the transport has dropped either side of the channel.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn move_msg(name: &str) -> ProtocolMessage {
        ProtocolMessage::MovePiece {
            name: name.into(),
            destination: "L1".into(),
        }
    }

    #[test]
    fn test_outbound_waits_for_service() {
        let (mut channel, mut transport) = SyncChannel::new();
        channel.send(move_msg("a"));
        channel.send(move_msg("b"));
        assert!(transport.outbound.try_recv().is_err());
        assert_eq!(channel.pending_outbound(), 2);

        channel.service_channel();
        assert_eq!(channel.pending_outbound(), 0);
        assert_eq!(transport.outbound.try_recv().unwrap(), move_msg("a"));
        assert_eq!(transport.outbound.try_recv().unwrap(), move_msg("b"));
    }

    #[test]
    fn test_inbound_is_fifo() {
        let (mut channel, transport) = SyncChannel::new();
        transport.inbound.send(json!({"n": 1})).unwrap();
        transport.inbound.send(json!({"n": 2})).unwrap();
        assert!(channel.receive().is_none());

        channel.service_channel();
        assert_eq!(channel.receive().unwrap()["n"], 1);
        assert_eq!(channel.receive().unwrap()["n"], 2);
        assert!(channel.receive().is_none());
    }

    #[test]
    fn test_dropped_transport_is_reported_not_fatal() {
        let (mut channel, transport) = SyncChannel::new();
        drop(transport);
        channel.send(move_msg("a"));
        channel.service_channel();
        assert!(channel.is_disconnected());
        assert_eq!(channel.pending_outbound(), 0);
        assert!(channel.receive().is_none());
    }
}
