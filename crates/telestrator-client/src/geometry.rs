//! Mapping between the source video's intrinsic pixels and what is on screen.
//!
//! All stroke coordinates are expressed in intrinsic video pixels, so every
//! peer can replay them against its own display size.

use telestrator_media::raster::MAX_SIDE;
use telestrator_protocol::{DrawMessage, Point, Size};

/// Extra space trimmed off the drawing surface, in intrinsic video pixels.
///
/// `offset` is taken from the top and bottom (vertical scale), `inset` from
/// the left and right (horizontal scale).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub offset: f64,
    pub inset: f64,
}

/// Where the drawing surface sits relative to the displayed video
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub intrinsic: Size,
    pub displayed: Size,
    pub scale: Point,
    pub padding: Padding,
    pub surface: SurfaceRect,
}

impl Geometry {
    /// Fit `intrinsic` inside `available` without cropping and derive the
    /// surface placement. Returns `None` for empty or non-finite sizes.
    pub fn compute(intrinsic: Size, available: Size, padding: Padding) -> Option<Self> {
        if !intrinsic.is_drawable() || !available.is_drawable() {
            return None;
        }

        let displayed = contain(intrinsic, available);
        let scale = Point::new(
            displayed.width / intrinsic.width,
            displayed.height / intrinsic.height,
        );

        let offset = padding.offset * scale.y;
        let inset = padding.inset * scale.x;
        let surface = SurfaceRect {
            left: inset,
            top: offset / 2.0,
            width: (displayed.width - inset * 2.0).max(0.0),
            height: (displayed.height - (offset + padding.inset * scale.y)).max(0.0),
        };

        Some(Self {
            intrinsic,
            displayed,
            scale,
            padding,
            surface,
        })
    }

    /// Geometry announced by a remote `resize`: the surface covers the whole
    /// displayed area.
    pub fn from_remote(displayed: Size, intrinsic: Size) -> Option<Self> {
        if !intrinsic.is_drawable() || !displayed.is_drawable() {
            return None;
        }
        Some(Self {
            intrinsic,
            displayed,
            scale: Point::new(
                displayed.width / intrinsic.width,
                displayed.height / intrinsic.height,
            ),
            padding: Padding::default(),
            surface: SurfaceRect {
                left: 0.0,
                top: 0.0,
                width: displayed.width,
                height: displayed.height,
            },
        })
    }

    /// Page coordinates to intrinsic video coordinates.
    pub fn to_video(&self, page: Point) -> Point {
        Point::new(
            (page.x - self.surface.left) / self.scale.x,
            (page.y - self.surface.top) / self.scale.y,
        )
    }

    /// Intrinsic video coordinates back to page coordinates.
    pub fn to_page(&self, video: Point) -> Point {
        Point::new(
            video.x * self.scale.x + self.surface.left,
            video.y * self.scale.y + self.surface.top,
        )
    }

    /// Integer backing-store size of the drawing surface, or `None` when a
    /// side is not finite or exceeds [`MAX_SIDE`].
    pub fn surface_pixels(&self) -> Option<(u32, u32)> {
        Some((
            pixel_side(self.surface.width)?,
            pixel_side(self.surface.height)?,
        ))
    }

    pub fn resize_message(&self) -> DrawMessage {
        DrawMessage::resize(self.displayed, self.intrinsic)
    }
}

fn pixel_side(length: f64) -> Option<u32> {
    let rounded = length.round();
    (rounded.is_finite() && (0.0..=f64::from(MAX_SIDE)).contains(&rounded)).then(|| rounded as u32)
}

/// Largest size with the aspect ratio of `source` that fits in `bounds`.
pub fn contain(source: Size, bounds: Size) -> Size {
    // Cross-multiplied to keep exact results for integral sizes
    if bounds.width * source.height > bounds.height * source.width {
        // Pillarbox
        Size::new(source.width * bounds.height / source.height, bounds.height)
    } else {
        // Letterbox
        Size::new(bounds.width, source.height * bounds.width / source.width)
    }
}

/// Keeps the last known sizes so padding changes can recompute in place.
#[derive(Debug, Clone, Default)]
pub struct GeometrySync {
    padding: Padding,
    sizes: Option<(Size, Size)>,
    current: Option<Geometry>,
}

impl GeometrySync {
    pub fn new(padding: Padding) -> Self {
        Self {
            padding,
            ..Default::default()
        }
    }

    pub fn current(&self) -> Option<&Geometry> {
        self.current.as_ref()
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Recompute for a video or viewport resize.
    pub fn on_resize(&mut self, intrinsic: Size, available: Size) -> Option<Geometry> {
        self.sizes = Some((intrinsic, available));
        self.current = Geometry::compute(intrinsic, available, self.padding);
        self.current
    }

    /// Change the padding and recompute with the last known sizes.
    pub fn set_padding(&mut self, padding: Padding) -> Option<Geometry> {
        self.padding = padding;
        let (intrinsic, available) = self.sizes?;
        self.on_resize(intrinsic, available)
    }

    /// Page to video coordinates, or the identity before the first resize.
    pub fn to_video(&self, page: Point) -> Point {
        self.current.map_or(page, |g| g.to_video(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: Size = Size::new(1920.0, 1080.0);

    #[test]
    fn half_size_display_scales_by_half() {
        let g = Geometry::compute(HD, Size::new(960.0, 540.0), Padding::default()).unwrap();
        assert_eq!(g.displayed, Size::new(960.0, 540.0));
        assert_eq!(g.scale, Point::new(0.5, 0.5));
        assert_eq!(g.to_video(Point::new(100.0, 100.0)), Point::new(200.0, 200.0));
        assert_eq!(g.to_page(Point::new(200.0, 200.0)), Point::new(100.0, 100.0));
    }

    #[test]
    fn wide_box_is_pillarboxed() {
        let g = Geometry::compute(HD, Size::new(2000.0, 540.0), Padding::default()).unwrap();
        assert_eq!(g.displayed, Size::new(960.0, 540.0));
    }

    #[test]
    fn tall_box_is_letterboxed() {
        let g = Geometry::compute(HD, Size::new(960.0, 2000.0), Padding::default()).unwrap();
        assert_eq!(g.displayed, Size::new(960.0, 540.0));
    }

    #[test]
    fn padding_shrinks_and_offsets_the_surface() {
        let padding = Padding {
            offset: 40.0,
            inset: 20.0,
        };
        let g = Geometry::compute(HD, Size::new(960.0, 540.0), padding).unwrap();
        assert_eq!(g.surface.left, 10.0);
        assert_eq!(g.surface.top, 10.0);
        assert_eq!(g.surface.width, 940.0);
        assert_eq!(g.surface.height, 510.0);
        assert_eq!(g.to_video(Point::new(10.0, 10.0)), Point::new(0.0, 0.0));
    }

    #[test]
    fn empty_sizes_produce_no_geometry() {
        assert!(Geometry::compute(Size::new(0.0, 1080.0), HD, Padding::default()).is_none());
        assert!(Geometry::compute(HD, Size::new(100.0, f64::NAN), Padding::default()).is_none());
    }

    #[test]
    fn padding_change_reuses_last_sizes() {
        let mut sync = GeometrySync::default();
        assert!(sync.set_padding(Padding { offset: 10.0, inset: 0.0 }).is_none());

        sync.on_resize(HD, Size::new(960.0, 540.0));
        let g = sync
            .set_padding(Padding {
                offset: 0.0,
                inset: 100.0,
            })
            .unwrap();
        assert_eq!(g.surface.left, 50.0);
    }

    #[test]
    fn surface_pixels_refuse_huge_sides() {
        let g = Geometry::from_remote(HD, HD).unwrap();
        assert_eq!(g.surface_pixels(), Some((1920, 1080)));

        let huge = Size::new(4294967295.0, 4294967295.0);
        let g = Geometry::from_remote(huge, HD).unwrap();
        assert_eq!(g.surface_pixels(), None);
    }

    #[test]
    fn identity_before_first_resize() {
        let sync = GeometrySync::default();
        assert_eq!(sync.to_video(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
    }
}
