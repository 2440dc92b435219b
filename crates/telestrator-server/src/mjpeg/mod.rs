//! Broadcast bridge: turns pushed snapshots into `multipart/x-mixed-replace`
//! streams for OBS-style consumers.

pub mod handler;

use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use telestrator_media::FrameSnapshot;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// A registered consumer. Dropping `frames` detaches it on the next push.
pub struct Subscription {
    pub id: SubscriberId,
    pub frames: mpsc::Receiver<Bytes>,
}

pub struct MjpegBridge {
    sinks: RwLock<HashMap<SubscriberId, mpsc::Sender<Bytes>>>,
    sink_timeout: Duration,
    sink_buffer: usize,
}

impl MjpegBridge {
    pub fn new(sink_timeout: Duration, sink_buffer: usize) -> Self {
        Self {
            sinks: RwLock::new(HashMap::new()),
            sink_timeout,
            sink_buffer: sink_buffer.max(1),
        }
    }

    /// Register a new consumer. It receives nothing until the next push.
    pub async fn subscribe(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, frames) = mpsc::channel(self.sink_buffer);
        self.sinks.write().await.insert(id, tx);
        tracing::debug!(subscriber = %id, "MJPEG subscriber added");
        Subscription { id, frames }
    }

    pub async fn unsubscribe(&self, id: SubscriberId) {
        if self.sinks.write().await.remove(&id).is_some() {
            tracing::debug!(subscriber = %id, "MJPEG subscriber removed");
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.sinks.read().await.len()
    }

    /// Offer one frame to every subscriber. Sinks that are gone or stay full
    /// past the timeout are dropped. Returns how many sinks took the frame.
    pub async fn push(&self, frame: &FrameSnapshot) -> usize {
        let sinks: Vec<_> = self
            .sinks
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();
        if sinks.is_empty() {
            return 0;
        }

        let part = frame.to_multipart_part();
        let timeout = self.sink_timeout;
        let results = futures_util::future::join_all(sinks.into_iter().map(|(id, tx)| {
            let part = part.clone();
            async move { (id, tx.send_timeout(part, timeout).await) }
        }))
        .await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(subscriber = %id, "Dropping MJPEG subscriber: {}", e);
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut sinks = self.sinks.write().await;
            for id in &failed {
                sinks.remove(id);
            }
        }

        tracing::trace!(bytes = part.len(), delivered, dropped = failed.len(), "Pushed frame");
        delivered
    }

    /// Wipe the broadcast output.
    pub async fn push_blank(&self) -> usize {
        self.push(&FrameSnapshot::blank()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telestrator_media::frame::read_multipart_part;

    fn bridge() -> MjpegBridge {
        MjpegBridge::new(Duration::from_millis(50), 2)
    }

    fn frame(byte: u8) -> FrameSnapshot {
        FrameSnapshot::new("image/png", vec![byte; 4])
    }

    fn body(part: &Bytes) -> Bytes {
        read_multipart_part(part).map(|(body, _)| body).unwrap()
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_later_frames() {
        let bridge = bridge();
        assert_eq!(bridge.push(&frame(1)).await, 0);

        let mut sub = bridge.subscribe().await;
        assert!(sub.frames.try_recv().is_err());

        assert_eq!(bridge.push(&frame(2)).await, 1);
        let part = sub.frames.recv().await.unwrap();
        assert_eq!(body(&part), Bytes::from(vec![2u8; 4]));
        assert!(sub.frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_part() {
        let bridge = bridge();
        let mut a = bridge.subscribe().await;
        let mut b = bridge.subscribe().await;
        assert_eq!(bridge.push(&frame(7)).await, 2);
        assert_eq!(a.frames.recv().await, b.frames.recv().await);
    }

    #[tokio::test]
    async fn closed_subscriber_is_reaped() {
        let bridge = bridge();
        let sub = bridge.subscribe().await;
        let mut live = bridge.subscribe().await;
        drop(sub.frames);

        assert_eq!(bridge.push(&frame(1)).await, 1);
        assert_eq!(bridge.subscriber_count().await, 1);
        assert!(live.frames.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_subscriber_is_dropped_healthy_one_still_served() {
        let bridge = bridge();
        let _stalled = bridge.subscribe().await;
        let mut healthy = bridge.subscribe().await;

        // Fill the stalled sink's buffer of two
        for n in 0..2 {
            assert_eq!(bridge.push(&frame(n)).await, 2);
            healthy.frames.recv().await.unwrap();
        }

        assert_eq!(bridge.push(&frame(9)).await, 1);
        assert_eq!(bridge.subscriber_count().await, 1);
        let part = healthy.frames.recv().await.unwrap();
        assert_eq!(body(&part), Bytes::from(vec![9u8; 4]));
    }

    #[tokio::test]
    async fn unsubscribe_removes_sink() {
        let bridge = bridge();
        let sub = bridge.subscribe().await;
        bridge.unsubscribe(sub.id).await;
        assert_eq!(bridge.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn blank_push_sends_the_transparent_gif() {
        let bridge = bridge();
        let mut sub = bridge.subscribe().await;
        bridge.push_blank().await;
        let part = sub.frames.recv().await.unwrap();
        assert_eq!(body(&part), FrameSnapshot::blank().data);
    }
}
