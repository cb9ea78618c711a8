use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::{
    error::Error,
    registry::PeerRegistry,
    transport::{ConnectionToken, Inbound, OutboundMessage, SignalingTransport, TransportEvent},
    PeerId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    SignedIn,
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Failed(String),
}

/// Transport events after validation against the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { local_id: PeerId },
    Disconnected,
    PeerConnected { id: PeerId, name: String },
    PeerDisconnected { id: PeerId },
    MessageReceived { peer_id: PeerId, payload: String },
    MessageSent {
        peer_id: PeerId,
        attempt: u64,
        outcome: SendOutcome,
    },
    ServerConnectionFailure { reason: String },
}

/// Login lifecycle with the signaling server and the per-peer message channel.
pub struct SignalingSession<T> {
    transport: T,
    state: SessionState,
    server_address: Option<String>,
    server_port: Option<u16>,
    local_peer_id: Option<PeerId>,
    token: ConnectionToken,
    next_attempt: u64,
    outbound: VecDeque<OutboundMessage>,
}

impl<T> std::fmt::Debug for SignalingSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingSession")
            .field("state", &self.state)
            .field("server_address", &self.server_address)
            .field("server_port", &self.server_port)
            .field("local_peer_id", &self.local_peer_id)
            .field("token", &self.token)
            .field("pending", &self.outbound.len())
            .finish()
    }
}

impl<T: SignalingTransport> SignalingSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::Idle,
            server_address: None,
            server_port: None,
            local_peer_id: None,
            token: ConnectionToken::default(),
            next_attempt: 1,
            outbound: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn server_address(&self) -> Option<&str> {
        self.server_address.as_deref()
    }

    pub fn server_port(&self) -> Option<u16> {
        self.server_port
    }

    pub fn local_peer_id(&self) -> Option<PeerId> {
        self.local_peer_id
    }

    pub fn token(&self) -> ConnectionToken {
        self.token
    }

    /// Messages handed to the transport and not yet acknowledged.
    pub fn pending(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.outbound.iter()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[tracing::instrument(skip(self))]
    pub fn login(&mut self, address: &str, port: u16) -> Result<(), Error> {
        if self.state != SessionState::Idle {
            return Err(Error::invalid_state("login", self.state));
        }
        self.token = self.token.next();
        self.state = SessionState::Connecting;
        self.server_address = Some(address.to_string());
        self.server_port = Some(port);
        info!("Connecting to {address}:{port} ({})", self.token);
        self.transport.connect(self.token, address, port);
        Ok(())
    }

    /// Also cancels a login that is still in flight.
    pub fn logout(&mut self) -> Result<(), Error> {
        match self.state {
            SessionState::SignedIn | SessionState::Connecting => {
                info!("Signing out ({})", self.token);
                self.state = SessionState::Disconnecting;
                self.transport.disconnect(self.token);
                Ok(())
            }
            state => Err(Error::invalid_state("logout", state)),
        }
    }

    /// Queues `payload` for `peer_id` and returns the attempt number the
    /// acknowledgment will carry.
    pub fn send_to_peer(
        &mut self,
        registry: &PeerRegistry,
        peer_id: PeerId,
        payload: String,
    ) -> Result<u64, Error> {
        if self.state != SessionState::SignedIn {
            return Err(Error::invalid_state("send", self.state));
        }
        if !registry.contains(peer_id) {
            return Err(Error::PeerUnknown(peer_id));
        }
        let attempt = self.next_attempt;
        self.next_attempt += 1;
        let message = OutboundMessage::new(peer_id, payload, attempt);
        debug!(attempt, peer_id, "Sending message");
        self.transport.send_text(self.token, &message);
        self.outbound.push_back(message);
        Ok(attempt)
    }

    /// Applies a transport event. Returns `None` when the event is stale or does
    /// not make sense in the current state.
    pub fn handle(&mut self, inbound: Inbound) -> Option<SessionEvent> {
        let Inbound { token, event } = inbound;
        if token != self.token {
            debug!(?event, "Dropping event from superseded connection {token}");
            return None;
        }

        match (self.state, event) {
            (SessionState::Connecting, TransportEvent::SignedIn { local_id }) => {
                info!("Signed in as peer {local_id}");
                self.state = SessionState::SignedIn;
                self.local_peer_id = Some(local_id);
                Some(SessionEvent::SignedIn { local_id })
            }
            (SessionState::Connecting, TransportEvent::ConnectionFailure(reason)) => {
                warn!("Could not reach signaling server: {reason}");
                self.reset();
                Some(SessionEvent::ServerConnectionFailure { reason })
            }
            (SessionState::Connecting, TransportEvent::Disconnected) => {
                warn!("Server closed the connection before signing us in");
                self.reset();
                Some(SessionEvent::ServerConnectionFailure {
                    reason: "connection closed before sign-in".to_string(),
                })
            }
            (SessionState::SignedIn, TransportEvent::PeerConnected { id, name }) => {
                if Some(id) == self.local_peer_id {
                    return None;
                }
                Some(SessionEvent::PeerConnected { id, name })
            }
            (SessionState::SignedIn, TransportEvent::PeerDisconnected { id }) => {
                Some(SessionEvent::PeerDisconnected { id })
            }
            (SessionState::SignedIn, TransportEvent::MessageReceived { peer_id, payload }) => {
                Some(SessionEvent::MessageReceived { peer_id, payload })
            }
            (
                SessionState::SignedIn | SessionState::Disconnecting,
                TransportEvent::MessageSent { attempt, result },
            ) => {
                let index = self.outbound.iter().position(|m| *m.attempt() == attempt)?;
                let message = self.outbound.remove(index)?;
                let outcome = match result {
                    Ok(()) => SendOutcome::Delivered,
                    Err(reason) => {
                        warn!(attempt, "Message to {} failed: {reason}", message.target_peer_id());
                        SendOutcome::Failed(reason)
                    }
                };
                Some(SessionEvent::MessageSent {
                    peer_id: *message.target_peer_id(),
                    attempt,
                    outcome,
                })
            }
            (SessionState::SignedIn, TransportEvent::ConnectionFailure(reason)) => {
                warn!("Lost connection to signaling server: {reason}");
                self.reset();
                Some(SessionEvent::ServerConnectionFailure { reason })
            }
            (SessionState::SignedIn, TransportEvent::Disconnected) => {
                info!("Server closed the connection");
                self.reset();
                Some(SessionEvent::Disconnected)
            }
            (
                SessionState::Disconnecting,
                TransportEvent::Disconnected | TransportEvent::ConnectionFailure(_),
            ) => {
                info!("Signed out");
                self.reset();
                Some(SessionEvent::Disconnected)
            }
            (state, event) => {
                debug!(?event, "Ignoring event in state {state:?}");
                None
            }
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.local_peer_id = None;
        self.outbound.clear();
    }
}
