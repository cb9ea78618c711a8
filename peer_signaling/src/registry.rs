use std::collections::BTreeMap;

use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::PeerId;

#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Peer {
    id: PeerId,
    name: String,
}

impl Peer {
    pub fn new<S: AsRef<str>>(id: PeerId, name: S) -> Self {
        Self {
            id,
            name: name.as_ref().to_string(),
        }
    }
}

/// Peers currently visible through the signaling server.
///
/// Only the conductor writes to the registry, from its event handling path.
/// Everything else gets shared references.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<PeerId, Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the peer, replacing any entry with the same id.
    pub fn upsert(&mut self, peer: Peer) -> Option<Peer> {
        self.peers.insert(peer.id, peer)
    }

    pub fn remove(&mut self, id: PeerId) -> Option<Peer> {
        self.peers.remove(&id)
    }

    pub fn get(&self, id: PeerId) -> Option<&Peer> {
        self.peers.get(&id)
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    /// Peers ordered by id. The iterator can be cloned to walk the roster again.
    pub fn all(&self) -> impl Iterator<Item = &Peer> + Clone + '_ {
        self.peers.values()
    }

    pub fn snapshot(&self) -> Vec<Peer> {
        self.all().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
