use getset::CopyGetters;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, ErrorKind},
    negotiation::{NegotiationStep, Negotiator},
    registry::{Peer, PeerRegistry},
    session::{SendOutcome, SessionEvent, SessionState, SignalingSession},
    transport::{Inbound, SignalingTransport},
    PeerId,
};

/// What the user surface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    ConnectPrompt,
    PeerList,
    InSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    #[default]
    None,
    Connecting,
    Connected,
}

/// The one remote peer we are negotiating with, or in a session with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ActivePeerConnection {
    remote_peer_id: PeerId,
    state: ConnState,
    /// Number of this call, passed to the negotiator.
    attempt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiIntent {
    Login { address: String, port: u16 },
    Logout,
    ConnectToPeer(PeerId),
    DisconnectCurrentPeer,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    ShowConnectPrompt,
    ShowPeerList(Vec<Peer>),
    ShowInSession(PeerId),
    ShowError { kind: ErrorKind, message: String },
}

impl UiCommand {
    pub fn render<U: UiSurface + ?Sized>(&self, ui: &mut U) {
        match self {
            UiCommand::ShowConnectPrompt => ui.show_connect_prompt(),
            UiCommand::ShowPeerList(peers) => ui.show_peer_list(peers),
            UiCommand::ShowInSession(peer) => ui.show_in_session(*peer),
            UiCommand::ShowError { kind, message } => ui.show_error(*kind, message),
        }
    }
}

/// Rendering side of the user interface.
pub trait UiSurface {
    fn show_connect_prompt(&mut self);
    fn show_peer_list(&mut self, peers: &[Peer]);
    fn show_in_session(&mut self, peer: PeerId);
    fn show_error(&mut self, kind: ErrorKind, message: &str);
}

/// Forwards commands to a UI living elsewhere, e.g. on its own thread.
impl UiSurface for UnboundedSender<UiCommand> {
    fn show_connect_prompt(&mut self) {
        let _ = self.send(UiCommand::ShowConnectPrompt);
    }

    fn show_peer_list(&mut self, peers: &[Peer]) {
        let _ = self.send(UiCommand::ShowPeerList(peers.to_vec()));
    }

    fn show_in_session(&mut self, peer: PeerId) {
        let _ = self.send(UiCommand::ShowInSession(peer));
    }

    fn show_error(&mut self, kind: ErrorKind, message: &str) {
        let _ = self.send(UiCommand::ShowError {
            kind,
            message: message.to_string(),
        });
    }
}

/// Mediates between the user surface, the signaling session and the negotiator.
///
/// The conductor is the only place that decides UI transitions and the only
/// writer of the peer registry. Every entry point returns the UI commands the
/// caller has to render, in order.
pub struct Conductor<T, N> {
    session: SignalingSession<T>,
    registry: PeerRegistry,
    negotiator: N,
    active: Option<ActivePeerConnection>,
    calls: u64,
    ui: UiState,
}

impl<T, N> std::fmt::Debug for Conductor<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conductor")
            .field("ui", &self.ui)
            .field("session", &self.session)
            .field("registry", &self.registry)
            .field("active", &self.active)
            .finish()
    }
}

impl<T: SignalingTransport, N: Negotiator> Conductor<T, N> {
    pub fn new(transport: T, negotiator: N) -> Self {
        Self {
            session: SignalingSession::new(transport),
            registry: PeerRegistry::new(),
            negotiator,
            active: None,
            calls: 0,
            ui: UiState::ConnectPrompt,
        }
    }

    pub fn ui_state(&self) -> UiState {
        self.ui
    }

    pub fn session(&self) -> &SignalingSession<T> {
        &self.session
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<ActivePeerConnection> {
        self.active
    }

    pub fn connection_state(&self) -> ConnState {
        self.active.map(|a| a.state).unwrap_or_default()
    }

    /// Applies a user intent. State machine violations are rejected here,
    /// before anything changes.
    pub fn handle_intent(&mut self, intent: UiIntent) -> Result<Vec<UiCommand>, Error> {
        debug!(?intent, ui = ?self.ui, "Handling intent");
        let mut out = Vec::new();
        match intent {
            UiIntent::Login { address, port } => self.login(&address, port)?,
            UiIntent::Logout => self.logout(&mut out)?,
            UiIntent::ConnectToPeer(id) => self.connect_to_peer(id, &mut out)?,
            UiIntent::DisconnectCurrentPeer => self.disconnect_current_peer(&mut out),
            UiIntent::Close => self.close(&mut out),
        }
        Ok(out)
    }

    pub fn handle_transport(&mut self, inbound: Inbound) -> Vec<UiCommand> {
        let mut out = Vec::new();
        if let Some(event) = self.session.handle(inbound) {
            self.on_session_event(event, &mut out);
        }
        out
    }

    fn login(&mut self, address: &str, port: u16) -> Result<(), Error> {
        if self.ui != UiState::ConnectPrompt {
            return Err(Error::invalid_state("login", self.ui));
        }
        self.session.login(address, port)
    }

    fn logout(&mut self, out: &mut Vec<UiCommand>) -> Result<(), Error> {
        match self.session.state() {
            SessionState::Idle | SessionState::Disconnecting => {
                debug!("Already signed out");
                Ok(())
            }
            SessionState::Connecting | SessionState::SignedIn => {
                self.hang_up(out);
                self.session.logout()
            }
        }
    }

    fn connect_to_peer(&mut self, id: PeerId, out: &mut Vec<UiCommand>) -> Result<(), Error> {
        if let Some(active) = self.active {
            return Err(Error::PeerBusy(active.remote_peer_id));
        }
        if self.ui != UiState::PeerList {
            return Err(Error::invalid_state("connect to peer", self.ui));
        }
        if self.session.state() != SessionState::SignedIn {
            return Err(Error::invalid_state("connect to peer", self.session.state()));
        }
        if !self.registry.contains(id) {
            return Err(Error::PeerUnknown(id));
        }

        self.calls += 1;
        let attempt = self.calls;
        info!(attempt, "Connecting to peer {id}");
        self.active = Some(ActivePeerConnection {
            remote_peer_id: id,
            state: ConnState::Connecting,
            attempt,
        });
        let steps = self.negotiator.start(id, attempt);
        self.apply_steps(id, steps, out);
        Ok(())
    }

    fn disconnect_current_peer(&mut self, out: &mut Vec<UiCommand>) {
        if self.hang_up(out) {
            self.show_peer_list(out);
        }
    }

    fn close(&mut self, out: &mut Vec<UiCommand>) {
        if let Err(e) = self.logout(out) {
            warn!(?e, "Could not sign out while closing");
        }
    }

    /// Ends the active peer connection on our side, if there is one.
    fn hang_up(&mut self, out: &mut Vec<UiCommand>) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        let remote = active.remote_peer_id;
        info!("Hanging up on peer {remote}");
        let steps = self.negotiator.hang_up(remote);
        self.apply_steps(remote, steps, out);
        true
    }

    fn abandon(&mut self) {
        if let Some(active) = self.active.take() {
            self.negotiator.abandon(active.remote_peer_id);
        }
    }

    fn apply_steps(&mut self, remote: PeerId, steps: Vec<NegotiationStep>, out: &mut Vec<UiCommand>) {
        for step in steps {
            match step {
                NegotiationStep::Send(payload) => {
                    if let Err(e) = self.session.send_to_peer(&self.registry, remote, payload) {
                        warn!(?e, "Could not send negotiation message to {remote}");
                    }
                }
                NegotiationStep::Established => match &mut self.active {
                    Some(active)
                        if active.remote_peer_id == remote
                            && active.state == ConnState::Connecting =>
                    {
                        info!("Session with peer {remote} established");
                        active.state = ConnState::Connected;
                        self.ui = UiState::InSession;
                        out.push(UiCommand::ShowInSession(remote));
                    }
                    _ => debug!("Ignoring established for {remote}"),
                },
                NegotiationStep::Ended => {
                    if self.active.map(|a| a.remote_peer_id) == Some(remote) {
                        info!("Peer {remote} hung up");
                        self.active = None;
                        self.show_peer_list(out);
                    }
                }
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent, out: &mut Vec<UiCommand>) {
        match event {
            SessionEvent::SignedIn { .. } => self.show_peer_list(out),
            SessionEvent::Disconnected => self.show_connect_prompt(out),
            SessionEvent::ServerConnectionFailure { reason } => {
                self.show_connect_prompt(out);
                out.push(UiCommand::ShowError {
                    kind: ErrorKind::TransportFailure,
                    message: Error::TransportFailure(reason).to_string(),
                });
            }
            SessionEvent::PeerConnected { id, name } => {
                debug!("Peer {id} ({name}) connected");
                self.registry.upsert(Peer::new(id, name));
                self.refresh_peer_list(out);
            }
            SessionEvent::PeerDisconnected { id } => {
                debug!("Peer {id} disconnected");
                self.registry.remove(id);
                if self.active.map(|a| a.remote_peer_id) == Some(id) {
                    info!("Active peer {id} went away");
                    self.abandon();
                    self.show_peer_list(out);
                } else {
                    self.refresh_peer_list(out);
                }
            }
            SessionEvent::MessageReceived { peer_id, payload } => {
                if let Some(active) = self.active.filter(|a| a.remote_peer_id == peer_id) {
                    let steps = self.negotiator.on_message(peer_id, active.attempt, &payload);
                    self.apply_steps(peer_id, steps, out);
                } else {
                    debug!("Dropping message from {peer_id}, not our active peer");
                }
            }
            SessionEvent::MessageSent {
                peer_id,
                attempt,
                outcome,
            } => match outcome {
                SendOutcome::Delivered => debug!(attempt, "Message to {peer_id} delivered"),
                SendOutcome::Failed(reason) => out.push(UiCommand::ShowError {
                    kind: ErrorKind::SendFailure,
                    message: Error::SendFailure {
                        peer_id,
                        attempt,
                        reason,
                    }
                    .to_string(),
                }),
            },
        }
    }

    fn show_connect_prompt(&mut self, out: &mut Vec<UiCommand>) {
        self.abandon();
        self.registry.clear();
        self.ui = UiState::ConnectPrompt;
        out.push(UiCommand::ShowConnectPrompt);
    }

    fn show_peer_list(&mut self, out: &mut Vec<UiCommand>) {
        self.ui = UiState::PeerList;
        out.push(UiCommand::ShowPeerList(self.registry.snapshot()));
    }

    fn refresh_peer_list(&self, out: &mut Vec<UiCommand>) {
        if self.ui == UiState::PeerList {
            out.push(UiCommand::ShowPeerList(self.registry.snapshot()));
        }
    }
}
