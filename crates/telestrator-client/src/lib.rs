//! Telestrator drawing client
//!
//! Turns pointer input into strokes on a local raster, replicates them over a
//! low-latency direct channel and pushes throttled raster snapshots over the
//! relay for broadcast.

pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod relay_client;
pub mod runtime;
pub mod session;
pub mod surface;
pub mod throttle;
pub mod transport;

pub use error::ClientError;
pub use geometry::{Geometry, GeometrySync, Padding};
pub use history::{UndoStack, UndoStep};
pub use input::{InputEvent, InputPhase, PointerKind, Touch};
pub use relay_client::{RelayClient, RelayInbound};
pub use runtime::SessionHandle;
pub use session::{DrawingSession, InputOutcome, Stroke, UndoTrigger};
pub use surface::Surface;
pub use throttle::FrameThrottle;
pub use transport::OutboundChannel;
