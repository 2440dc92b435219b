//! WebSocket client for the signaling relay.

use futures_util::{SinkExt, StreamExt};
use telestrator_protocol::{RelayEnvelope, RelayNotice};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{ClientError, Result};
use crate::transport::OutboundChannel;

/// Something the relay delivered to this peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayInbound {
    /// Another peer asked everyone to renegotiate
    Reset,
    /// An opaque signaling payload, possibly our own echoed back
    Signal(String),
}

impl RelayInbound {
    fn classify(text: String) -> Self {
        match serde_json::from_str::<RelayNotice>(&text) {
            Ok(RelayNotice::Reset) => RelayInbound::Reset,
            Err(_) => RelayInbound::Signal(text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    outbound: mpsc::UnboundedSender<String>,
}

impl RelayClient {
    /// Connect and spawn the writer and reader tasks. Inbound frames arrive on
    /// the returned receiver, which closes when the connection ends.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<RelayInbound>)> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (outbound, mut rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    tracing::error!("Failed to send relay message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        let message = RelayInbound::classify(text.to_string());
                        if inbound_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Relay closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Relay connection error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        tracing::info!("Connected to relay at {}", url);
        Ok((Self { outbound }, inbound))
    }

    /// An outbound channel for snapshots, suitable as a session's wide channel.
    pub fn channel(&self) -> Box<dyn OutboundChannel> {
        Box::new(self.outbound.clone())
    }

    pub fn is_connected(&self) -> bool {
        !self.outbound.is_closed()
    }

    pub fn send_signal(&self, payload: impl Into<String>) -> Result<()> {
        self.send(RelayEnvelope::signal(payload)?)
    }

    /// Ask every other peer to reset.
    pub fn request_reset(&self) -> Result<()> {
        self.send(RelayEnvelope::reset_request())
    }

    /// Forward a diagnostic line to the relay's log.
    pub fn log(&self, line: &str) -> Result<()> {
        self.send(RelayEnvelope::log(line))
    }

    fn send(&self, envelope: RelayEnvelope) -> Result<()> {
        tracing::trace!(kind = envelope.kind(), "Relay send");
        self.outbound
            .send(envelope.into_text())
            .map_err(|_| ClientError::ChannelClosed)
    }
}
