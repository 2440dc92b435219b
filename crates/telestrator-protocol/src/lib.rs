//! Shared protocol definitions for Telestrator
//!
//! Two transports carry drawing state between peers:
//! - the direct channel, which carries JSON [`DrawMessage`]s for every stroke event
//! - the relay, whose text frames are classified by their first character
//!   (see [`RelayEnvelope`])

pub mod envelope;
pub mod error;
pub mod messages;
pub mod types;

pub use envelope::RelayEnvelope;
pub use error::ProtocolError;
pub use messages::{DrawMessage, RelayNotice};
pub use types::{Point, Size};
