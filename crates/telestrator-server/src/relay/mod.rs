//! WebSocket signaling relay.
//!
//! Frames are routed by their first character (see [`RelayEnvelope`]); the
//! relay never looks inside signaling payloads.

pub mod handler;
pub mod registry;

pub use registry::{PeerId, PeerRegistry};

use crate::mjpeg::MjpegBridge;
use crate::state::PendingPolicy;
use std::sync::Arc;
use telestrator_media::FrameSnapshot;
use telestrator_protocol::{RelayEnvelope, RelayNotice};
use tokio::sync::{RwLock, mpsc};

pub struct SignalingRelay {
    registry: RwLock<PeerRegistry>,
    bridge: Arc<MjpegBridge>,
    pending_policy: PendingPolicy,
}

impl SignalingRelay {
    pub fn new(bridge: Arc<MjpegBridge>, pending_policy: PendingPolicy) -> Self {
        Self {
            registry: RwLock::new(PeerRegistry::new()),
            bridge,
            pending_policy,
        }
    }

    pub fn bridge(&self) -> &Arc<MjpegBridge> {
        &self.bridge
    }

    /// Register a peer whose outbound frames go to `sender`.
    pub async fn connect(&self, sender: mpsc::UnboundedSender<String>) -> PeerId {
        let mut registry = self.registry.write().await;
        let peer = registry.insert(sender);
        tracing::info!(peer = %peer, peers = registry.len(), "Peer connected");

        if self.pending_policy == PendingPolicy::FlushOnQuorum
            && registry.len() == PeerRegistry::QUORUM
        {
            let pending = registry.take_pending();
            if !pending.is_empty() {
                tracing::debug!(count = pending.len(), "Flushing cached signals");
            }
            for text in pending {
                registry.broadcast(&text, None);
            }
        }

        peer
    }

    /// Queue a frame for one peer.
    pub async fn send(&self, peer: PeerId, text: String) -> bool {
        self.registry.read().await.send_to(peer, text)
    }

    /// Route one inbound frame from `peer`.
    pub async fn on_message(&self, peer: PeerId, text: String) {
        let envelope = RelayEnvelope::parse(text);
        tracing::trace!(peer = %peer, kind = envelope.kind(), "Relay frame");

        match envelope {
            RelayEnvelope::Log(line) => {
                tracing::info!(target: "telestrator::client_log", peer = %peer, "{}", line);
            }
            RelayEnvelope::ResetRequest(_) => {
                let notice = match serde_json::to_string(&RelayNotice::Reset) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize reset notice: {}", e);
                        return;
                    }
                };
                let notified = self.registry.read().await.broadcast(&notice, Some(peer));
                tracing::debug!(peer = %peer, notified, "Reset requested");
            }
            RelayEnvelope::DrawFrame(uri) => match FrameSnapshot::from_data_uri(&uri) {
                Ok(frame) => {
                    self.bridge.push(&frame).await;
                }
                Err(e) => {
                    tracing::warn!(peer = %peer, "Dropping undecodable frame: {}", e);
                }
            },
            RelayEnvelope::Signal(text) => {
                let mut registry = self.registry.write().await;
                if registry.has_quorum() {
                    let delivered = registry.broadcast(&text, None);
                    tracing::debug!(peer = %peer, delivered, "Signal broadcast");
                } else {
                    registry.cache(text);
                    tracing::debug!(peer = %peer, pending = registry.pending_len(), "Signal cached");
                }
            }
        }
    }

    /// Forget `peer` and wipe the broadcast output.
    pub async fn disconnect(&self, peer: PeerId) {
        let remaining = {
            let mut registry = self.registry.write().await;
            if !registry.remove(peer) {
                return;
            }
            registry.len()
        };
        tracing::info!(peer = %peer, peers = remaining, "Peer disconnected");

        // Some consumers hold on to the previous frame; send the blank twice.
        self.bridge.push_blank().await;
        self.bridge.push_blank().await;
    }

    pub async fn peer_count(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn pending_len(&self) -> usize {
        self.registry.read().await.pending_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;
    use telestrator_media::frame::read_multipart_part;
    use telestrator_media::{BLANK_FRAME_URI, data_uri};

    struct Peer {
        id: PeerId,
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl Peer {
        fn drain(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(text) = self.rx.try_recv() {
                out.push(text);
            }
            out
        }
    }

    fn relay(policy: PendingPolicy) -> SignalingRelay {
        let bridge = Arc::new(MjpegBridge::new(Duration::from_millis(100), 8));
        SignalingRelay::new(bridge, policy)
    }

    async fn join(relay: &SignalingRelay) -> Peer {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = relay.connect(tx).await;
        Peer { id, rx }
    }

    #[tokio::test]
    async fn signals_are_cached_until_quorum_then_broadcast() {
        let relay = relay(PendingPolicy::Retain);
        let mut host = join(&relay).await;
        relay.on_message(host.id, "{\"sdp\":1}".to_string()).await;
        relay.on_message(host.id, "{\"sdp\":2}".to_string()).await;
        assert_eq!(relay.pending_len().await, 2);
        assert!(host.drain().is_empty());

        let mut viewer = join(&relay).await;
        // Cached signals are never replayed
        assert!(viewer.drain().is_empty());

        relay.on_message(viewer.id, "{\"ice\":3}".to_string()).await;
        assert_eq!(host.drain(), vec!["{\"ice\":3}"]);
        // The sender hears its own signal too
        assert_eq!(viewer.drain(), vec!["{\"ice\":3}"]);
        assert_eq!(relay.pending_len().await, 2);
    }

    #[tokio::test]
    async fn flush_policy_delivers_cache_when_second_peer_joins() {
        let relay = relay(PendingPolicy::FlushOnQuorum);
        let mut host = join(&relay).await;
        relay.on_message(host.id, "offer".to_string()).await;

        let mut viewer = join(&relay).await;
        assert_eq!(viewer.drain(), vec!["offer"]);
        assert_eq!(host.drain(), vec!["offer"]);
        assert_eq!(relay.pending_len().await, 0);
    }

    #[tokio::test]
    async fn reset_request_notifies_everyone_but_the_sender() {
        let relay = relay(PendingPolicy::Retain);
        let mut a = join(&relay).await;
        let mut b = join(&relay).await;
        let mut c = join(&relay).await;

        relay.on_message(a.id, "reset".to_string()).await;
        assert!(a.drain().is_empty());
        assert_eq!(b.drain(), vec![r#"{"action":"reset"}"#]);
        assert_eq!(c.drain(), vec![r#"{"action":"reset"}"#]);
    }

    #[tokio::test]
    async fn log_lines_are_not_forwarded() {
        let relay = relay(PendingPolicy::Retain);
        let mut a = join(&relay).await;
        let mut b = join(&relay).await;
        relay.on_message(a.id, "log: hello".to_string()).await;
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());
        assert_eq!(relay.pending_len().await, 0);
    }

    #[tokio::test]
    async fn empty_frame_is_a_signal() {
        let relay = relay(PendingPolicy::Retain);
        let peer = join(&relay).await;
        relay.on_message(peer.id, String::new()).await;
        assert_eq!(relay.pending_len().await, 1);
    }

    #[tokio::test]
    async fn draw_frames_go_to_the_bridge_only() {
        let relay = relay(PendingPolicy::Retain);
        let mut a = join(&relay).await;
        let mut b = join(&relay).await;
        let mut sub = relay.bridge().subscribe().await;

        let uri = data_uri::encode("image/png", &[1, 2, 3]);
        relay.on_message(a.id, uri).await;

        let part = sub.frames.recv().await.unwrap();
        let (body, _) = read_multipart_part(&part).unwrap();
        assert_eq!(body, Bytes::from_static(&[1, 2, 3]));
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());
    }

    #[tokio::test]
    async fn malformed_draw_frame_is_dropped() {
        let relay = relay(PendingPolicy::Retain);
        let peer = join(&relay).await;
        let mut sub = relay.bridge().subscribe().await;

        relay.on_message(peer.id, "definitely not a data uri".to_string()).await;
        assert!(sub.frames.try_recv().is_err());
        assert_eq!(relay.pending_len().await, 0);
    }

    #[tokio::test]
    async fn disconnect_pushes_two_blank_frames() {
        let relay = relay(PendingPolicy::Retain);
        let peer = join(&relay).await;
        let mut sub = relay.bridge().subscribe().await;

        relay.disconnect(peer.id).await;
        assert_eq!(relay.peer_count().await, 0);

        let blank = FrameSnapshot::from_data_uri(BLANK_FRAME_URI).unwrap();
        for _ in 0..2 {
            let part = sub.frames.recv().await.unwrap();
            assert_eq!(read_multipart_part(&part).unwrap().0, blank.data);
        }
        assert!(sub.frames.try_recv().is_err());

        // A second disconnect of the same peer is a no-op
        relay.disconnect(peer.id).await;
        assert!(sub.frames.try_recv().is_err());
    }
}
