//! Media processing utilities for Telestrator
//!
//! This crate provides the image plumbing shared by the relay and the drawing client:
//! - `data:` URI decoding and encoding
//! - Multipart MJPEG part framing for the broadcast stream
//! - An RGBA raster surface with round-capped strokes and PNG export

pub mod color;
pub mod data_uri;
pub mod error;
pub mod frame;
pub mod raster;

pub use color::Rgba;
pub use error::MediaError;
pub use frame::{FrameSnapshot, BLANK_FRAME_URI};
pub use raster::{Raster, RasterSnapshot};
