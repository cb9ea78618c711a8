use std::fmt;

use getset::Getters;
use tokio::sync::mpsc::UnboundedSender;

use crate::{runtime::Task, PeerId};

/// Identifies one login attempt. Every transport event carries the token of the
/// connection it came from, so events from a superseded attempt can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionToken(u64);

impl ConnectionToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConnectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct OutboundMessage {
    target_peer_id: PeerId,
    payload: String,
    /// Sequence number of this send, echoed back in `TransportEvent::MessageSent`.
    attempt: u64,
}

impl OutboundMessage {
    pub fn new(target_peer_id: PeerId, payload: String, attempt: u64) -> Self {
        Self {
            target_peer_id,
            payload,
            attempt,
        }
    }
}

/// Everything a transport can report back, asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    SignedIn { local_id: PeerId },
    PeerConnected { id: PeerId, name: String },
    PeerDisconnected { id: PeerId },
    MessageReceived { peer_id: PeerId, payload: String },
    MessageSent { attempt: u64, result: Result<(), String> },
    /// Connection closed cleanly, either on request or by the server.
    Disconnected,
    ConnectionFailure(String),
}

/// A transport event tagged with the connection it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub token: ConnectionToken,
    pub event: TransportEvent,
}

/// Connection to the signaling server.
///
/// None of the methods block: outcomes are reported later through the
/// [`EventSink`] the transport was built with, stamped with the token passed in.
pub trait SignalingTransport {
    fn connect(&mut self, token: ConnectionToken, address: &str, port: u16);

    fn send_text(&mut self, token: ConnectionToken, message: &OutboundMessage);

    /// Must eventually answer with `Disconnected` (or `ConnectionFailure`) for `token`,
    /// also when the connection attempt is still in flight.
    fn disconnect(&mut self, token: ConnectionToken);
}

/// Feeds transport events into the conductor's queue, behind any pending intents.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<Task>,
}

impl EventSink {
    pub(crate) fn new(tx: UnboundedSender<Task>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, token: ConnectionToken, event: TransportEvent) {
        if self
            .tx
            .send(Task::Transport(Inbound { token, event }))
            .is_err()
        {
            tracing::debug!("conductor gone, dropping transport event for {token}");
        }
    }
}
