//! The rendering surface a session draws on.

use telestrator_media::{Raster, RasterSnapshot, Rgba};
use telestrator_protocol::Point;

use crate::error::Result;

/// Canvas-like drawing operations used by [`crate::DrawingSession`].
///
/// Coordinates are in video space; the surface applies its own scale.
pub trait Surface: Send {
    type Snapshot: Send + 'static;

    /// Resize the backing store, wiping pixels, path and transform. A size
    /// the surface cannot hold is an error and leaves it unchanged.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
    fn set_scale(&mut self, sx: f64, sy: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn stroke(&mut self, color: &str, width: f64);
    fn close_path(&mut self);
    /// Wipe to fully transparent.
    fn clear(&mut self);
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot);
    /// Encode the current pixels as a `data:` URI.
    fn encode_frame(&self) -> Result<String>;
}

impl Surface for Raster {
    type Snapshot = RasterSnapshot;

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        Ok(Raster::resize(self, width, height)?)
    }

    fn set_scale(&mut self, sx: f64, sy: f64) {
        Raster::set_scale(self, sx, sy);
    }

    fn begin_path(&mut self) {
        Raster::begin_path(self);
    }

    fn move_to(&mut self, point: Point) {
        Raster::move_to(self, point.x, point.y);
    }

    fn line_to(&mut self, point: Point) {
        Raster::line_to(self, point.x, point.y);
    }

    fn stroke(&mut self, color: &str, width: f64) {
        let rgba = Rgba::parse(color).unwrap_or_else(|| {
            tracing::debug!("Unrecognized stroke color {:?}, using black", color);
            Rgba::BLACK
        });
        Raster::stroke(self, rgba, width);
    }

    fn close_path(&mut self) {
        Raster::close_path(self);
    }

    fn clear(&mut self) {
        Raster::clear(self);
    }

    fn snapshot(&self) -> RasterSnapshot {
        Raster::snapshot(self)
    }

    fn restore(&mut self, snapshot: &RasterSnapshot) {
        Raster::restore(self, snapshot);
    }

    fn encode_frame(&self) -> Result<String> {
        Ok(self.to_data_uri()?)
    }
}
