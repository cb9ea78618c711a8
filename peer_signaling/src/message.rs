use crate::{transport::TransportEvent, PeerId};

/// Sent by the rendezvous server. `SignedIn` is always the first message on a connection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ServerMessage {
    SignedIn { id: PeerId },
    PeerConnected { id: PeerId, name: String },
    PeerDisconnected { id: PeerId },
    Relay { from: PeerId, payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClientMessage {
    Relay { to: PeerId, payload: String },
}

impl From<ServerMessage> for TransportEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::SignedIn { id } => TransportEvent::SignedIn { local_id: id },
            ServerMessage::PeerConnected { id, name } => TransportEvent::PeerConnected { id, name },
            ServerMessage::PeerDisconnected { id } => TransportEvent::PeerDisconnected { id },
            ServerMessage::Relay { from, payload } => TransportEvent::MessageReceived {
                peer_id: from,
                payload,
            },
        }
    }
}
