use tracing::debug;

use crate::PeerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationStep {
    /// Deliver this payload to the remote peer through the signaling server.
    Send(String),
    /// Both sides agree, the session can start.
    Established,
    /// The remote side hung up.
    Ended,
}

/// The peer-connection handshake driven by the conductor.
///
/// The conductor only ever talks to one remote at a time and only forwards
/// messages coming from that remote. Every call to the same or another remote
/// gets a fresh `attempt` number, so answers meant for an earlier call can be
/// told apart from the current one.
pub trait Negotiator {
    fn start(&mut self, remote: PeerId, attempt: u64) -> Vec<NegotiationStep>;

    fn on_message(&mut self, remote: PeerId, attempt: u64, payload: &str) -> Vec<NegotiationStep>;

    /// Local hang up. The returned messages are still delivered to `remote`.
    fn hang_up(&mut self, remote: PeerId) -> Vec<NegotiationStep>;

    /// The remote is gone (it disconnected or we lost the server); drop any state.
    fn abandon(&mut self, _remote: PeerId) {}
}

const OFFER: &str = "OFFER";
const ANSWER: &str = "ANSWER";
const BYE: &str = "BYE";

/// Plain text offer/answer exchange, enough to bring two clients into a session
/// when no media stack is plugged in.
///
/// Offers carry the caller's attempt number (`OFFER 3`) and answers echo it
/// (`ANSWER 3`). Both users have to pick each other: an offer only reaches the
/// other side once it has selected us too.
#[derive(Debug, Default)]
pub struct GreetingNegotiator;

impl Negotiator for GreetingNegotiator {
    fn start(&mut self, _remote: PeerId, attempt: u64) -> Vec<NegotiationStep> {
        vec![NegotiationStep::Send(format!("{OFFER} {attempt}"))]
    }

    fn on_message(&mut self, remote: PeerId, attempt: u64, payload: &str) -> Vec<NegotiationStep> {
        let (kind, number) = match payload.split_once(' ') {
            Some((kind, number)) => (kind, number.parse::<u64>().ok()),
            None => (payload, None),
        };
        match (kind, number) {
            (OFFER, Some(theirs)) => vec![
                NegotiationStep::Send(format!("{ANSWER} {theirs}")),
                NegotiationStep::Established,
            ],
            (ANSWER, Some(ours)) if ours == attempt => vec![NegotiationStep::Established],
            (ANSWER, Some(ours)) => {
                debug!("Dropping answer from {remote} to earlier call {ours}, current is {attempt}");
                vec![]
            }
            (BYE, None) => vec![NegotiationStep::Ended],
            _ => {
                debug!("Unexpected message from {remote}: {payload}");
                vec![]
            }
        }
    }

    fn hang_up(&mut self, _remote: PeerId) -> Vec<NegotiationStep> {
        vec![NegotiationStep::Send(BYE.to_string())]
    }
}
