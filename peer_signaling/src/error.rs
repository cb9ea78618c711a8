use std::fmt;

use crate::PeerId;

/// Category of a failure, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidState,
    PeerBusy,
    PeerUnknown,
    TransportFailure,
    SendFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::PeerBusy => "peer busy",
            ErrorKind::PeerUnknown => "unknown peer",
            ErrorKind::TransportFailure => "transport failure",
            ErrorKind::SendFailure => "send failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The operation is not allowed in the current state. Nothing changed.
    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("already negotiating with peer {0}")]
    PeerBusy(PeerId),

    #[error("peer {0} is not signed in")]
    PeerUnknown(PeerId),

    #[error("signaling server connection failed: {0}")]
    TransportFailure(String),

    #[error("message {attempt} to peer {peer_id} was not delivered: {reason}")]
    SendFailure {
        peer_id: PeerId,
        attempt: u64,
        reason: String,
    },

    #[error("conductor has stopped")]
    Closed,
}

impl Error {
    pub(crate) fn invalid_state(operation: &'static str, state: impl fmt::Debug) -> Self {
        Self::InvalidState {
            operation,
            state: format!("{state:?}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidState { .. } | Error::Closed => ErrorKind::InvalidState,
            Error::PeerBusy(_) => ErrorKind::PeerBusy,
            Error::PeerUnknown(_) => ErrorKind::PeerUnknown,
            Error::TransportFailure(_) => ErrorKind::TransportFailure,
            Error::SendFailure { .. } => ErrorKind::SendFailure,
        }
    }
}
