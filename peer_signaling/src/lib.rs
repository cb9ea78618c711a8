pub mod blocking;
pub mod conductor;
pub mod config;
pub mod error;
pub mod message;
pub mod negotiation;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod transport;
pub mod ws;

pub use blocking::BlockingClient;
pub use conductor::{ActivePeerConnection, ConnState, Conductor, UiCommand, UiIntent, UiState, UiSurface};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind};
pub use negotiation::{GreetingNegotiator, NegotiationStep, Negotiator};
pub use registry::{Peer, PeerRegistry};
pub use runtime::{ConductorHandle, Runtime};
pub use session::{SessionEvent, SessionState, SignalingSession};
pub use transport::{ConnectionToken, EventSink, OutboundMessage, SignalingTransport, TransportEvent};
pub use ws::WsTransport;

/// Id the signaling server hands out to every logged-in peer.
pub type PeerId = u32;
