use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type PeerId = Uuid;

/// Connected peers plus signals cached while under quorum.
///
/// Not synchronized; [`super::SignalingRelay`] keeps it behind one lock.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, mpsc::UnboundedSender<String>>,
    pending: Vec<String>,
}

impl PeerRegistry {
    /// Two peers are needed before signals are broadcast
    pub const QUORUM: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sender: mpsc::UnboundedSender<String>) -> PeerId {
        let id = Uuid::new_v4();
        self.peers.insert(id, sender);
        id
    }

    pub fn remove(&mut self, peer: PeerId) -> bool {
        self.peers.remove(&peer).is_some()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn has_quorum(&self) -> bool {
        self.peers.len() >= Self::QUORUM
    }

    /// Append a signal sent while under quorum. The cache is unbounded and
    /// only [`PeerRegistry::take_pending`] empties it: under
    /// `PendingPolicy::Retain` it lives for the whole process and is never
    /// delivered, while `PendingPolicy::FlushOnQuorum` drains it once the
    /// second peer joins.
    pub fn cache(&mut self, text: String) {
        self.pending.push(text);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// Queue `text` for one peer. Returns false if the peer is unknown or
    /// its writer is gone.
    pub fn send_to(&self, peer: PeerId, text: String) -> bool {
        match self.peers.get(&peer) {
            Some(sender) => match sender.send(text) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(peer = %peer, "Failed to queue message: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Queue `text` for every peer except `except`. Returns how many peers
    /// accepted it.
    pub fn broadcast(&self, text: &str, except: Option<PeerId>) -> usize {
        let mut delivered = 0;
        for (id, sender) in &self.peers {
            if Some(*id) == except {
                continue;
            }
            match sender.send(text.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(peer = %id, "Failed to queue message: {}", e),
            }
        }
        delivered
    }
}
