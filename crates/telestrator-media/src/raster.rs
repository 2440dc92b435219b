//! RGBA raster surface
//!
//! A small immediate-mode canvas: paths are collected in user space, mapped
//! through a scale transform and stroked with round caps and joins.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::color::Rgba;
use crate::data_uri;
use crate::error::{MediaError, Result};

/// Largest accepted width or height
pub const MAX_SIDE: u32 = 16_384;

/// Largest accepted pixel count (a 64 Mpx, 256 MiB backing store)
pub const MAX_AREA: u64 = 8_192 * 8_192;

/// Byte length of a `width` x `height` RGBA buffer, if it is within limits.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    if width > MAX_SIDE || height > MAX_SIDE {
        return None;
    }
    let area = u64::from(width) * u64::from(height);
    if area > MAX_AREA {
        return None;
    }
    usize::try_from(area).ok()?.checked_mul(4)
}

/// A full copy of the raster's pixels, as kept by undo history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSnapshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    scale: (f64, f64),
    /// Subpaths in user space; the last one is open.
    path: Vec<Vec<(f64, f64)>>,
}

impl Raster {
    /// A transparent raster. Sizes past [`MAX_SIDE`] or [`MAX_AREA`] yield
    /// an empty 0x0 raster; use [`Raster::try_new`] to detect that.
    pub fn new(width: u32, height: u32) -> Self {
        Self::try_new(width, height).unwrap_or_else(|e| {
            tracing::warn!("{}, using an empty raster", e);
            Self::blank(0, 0, Vec::new())
        })
    }

    pub fn try_new(width: u32, height: u32) -> Result<Self> {
        let len = buffer_len(width, height).ok_or(MediaError::SurfaceTooLarge { width, height })?;
        Ok(Self::blank(width, height, vec![0; len]))
    }

    fn blank(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            scale: (1.0, 1.0),
            path: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> (f64, f64) {
        self.scale
    }

    /// Resize the backing store. Like a canvas, this wipes the pixels, the
    /// transform and the current path. An oversized request leaves the
    /// raster untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Self::try_new(width, height)?;
        Ok(())
    }

    pub fn set_scale(&mut self, sx: f64, sy: f64) {
        self.scale = (sx, sy);
    }

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(vec![(x, y)]);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        match self.path.last_mut() {
            Some(subpath) => subpath.push((x, y)),
            None => self.path.push(vec![(x, y)]),
        }
    }

    /// End the current subpath; the next `line_to` starts a new one.
    pub fn close_path(&mut self) {
        if let Some(start) = self.path.last().and_then(|s| s.first()).copied() {
            self.path.push(vec![start]);
        }
    }

    /// Stroke every segment of the current path.
    pub fn stroke(&mut self, color: Rgba, line_width: f64) {
        let (sx, sy) = self.scale;
        let radius = (line_width * (sx + sy) / 2.0 / 2.0).max(0.5);
        let segments: Vec<((f64, f64), (f64, f64))> = self
            .path
            .iter()
            .flat_map(|subpath| subpath.windows(2).map(|w| (w[0], w[1])))
            .collect();

        for (a, b) in segments {
            let a = (a.0 * sx, a.1 * sy);
            let b = (b.0 * sx, b.1 * sy);
            self.fill_capsule(a, b, radius, color);
        }
    }

    /// Wipe every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn snapshot(&self) -> RasterSnapshot {
        RasterSnapshot {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }

    /// Copy a snapshot back at the origin, clipped to the current size.
    pub fn restore(&mut self, snapshot: &RasterSnapshot) {
        let cols = self.width.min(snapshot.width) as usize * 4;
        for row in 0..self.height.min(snapshot.height) as usize {
            let dst = row * self.width as usize * 4;
            let src = row * snapshot.width as usize * 4;
            self.pixels[dst..dst + cols].copy_from_slice(&snapshot.pixels[src..src + cols]);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[i..i + 4]);
        Some(Rgba(rgba))
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|p| p[3] == 0)
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            &self.pixels,
            self.width,
            self.height,
            ColorType::Rgba8,
        )?;
        Ok(out)
    }

    /// Encode as a `data:image/png;base64,...` URI.
    pub fn to_data_uri(&self) -> Result<String> {
        Ok(data_uri::encode("image/png", &self.to_png()?))
    }

    fn fill_capsule(&mut self, a: (f64, f64), b: (f64, f64), radius: f64, color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let min_x = (a.0.min(b.0) - radius).floor().max(0.0) as i64;
        let min_y = (a.1.min(b.1) - radius).floor().max(0.0) as i64;
        let max_x = ((a.0.max(b.0) + radius).ceil() as i64).min(self.width as i64 - 1);
        let max_y = ((a.1.max(b.1) + radius).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = (x as f64 + 0.5, y as f64 + 0.5);
                if distance_to_segment(center, a, b) <= radius {
                    self.blend(x as usize, y as usize, color);
                }
            }
        }
    }

    fn blend(&mut self, x: usize, y: usize, color: Rgba) {
        let i = (y * self.width as usize + x) * 4;
        let dst = &mut self.pixels[i..i + 4];
        let src_a = color.alpha() as u32;
        if src_a == 255 {
            dst.copy_from_slice(&color.0);
            return;
        }
        let dst_a = dst[3] as u32;
        let out_a = src_a + dst_a * (255 - src_a) / 255;
        if out_a == 0 {
            return;
        }
        for c in 0..3 {
            let blended = (color.0[c] as u32 * src_a
                + dst[c] as u32 * dst_a * (255 - src_a) / 255)
                / out_a;
            dst[c] = blended as u8;
        }
        dst[3] = out_a as u8;
    }
}

fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
