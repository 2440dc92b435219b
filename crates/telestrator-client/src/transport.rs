use tokio::sync::mpsc;

use crate::error::{ClientError, Result};

/// A fire-and-forget text transport (data channel, relay socket, ...)
pub trait OutboundChannel: Send {
    fn send_text(&mut self, text: String) -> Result<()>;
}

impl OutboundChannel for mpsc::UnboundedSender<String> {
    fn send_text(&mut self, text: String) -> Result<()> {
        self.send(text).map_err(|_| ClientError::ChannelClosed)
    }
}
