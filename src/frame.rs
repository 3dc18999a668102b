/*!
    Decoded frame types.
*/

use std::time::Duration;

use image::RgbaImage;

use crate::geometry::{Point, Rect};

/**
    An RGBA pixel buffer together with its content-extent origin.

    Applying an affine transform to a frame can move its bounding origin
    away from (0,0) — a quarter turn about the origin, for example, lands
    the content in negative x. The origin tracks where the content sits in
    frame coordinates; sink-bound render steps require it renormalized back
    to (0,0).
*/
#[derive(Clone, Debug)]
pub struct FrameImage {
    pub pixels: RgbaImage,
    pub origin: Point,
}

impl FrameImage {
    /**
        Create a frame with its content at the coordinate origin.
    */
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            origin: Point::ZERO,
        }
    }

    /**
        Create a frame with an explicit content origin.
    */
    pub fn with_origin(pixels: RgbaImage, origin: Point) -> Self {
        Self { pixels, origin }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /**
        The content extent in frame coordinates.
    */
    pub fn extent(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            f64::from(self.width()),
            f64::from(self.height()),
        )
    }

    pub fn has_zero_origin(&self) -> bool {
        self.origin.x.abs() < f64::EPSILON && self.origin.y.abs() < f64::EPSILON
    }

    /**
        Translate the content extent so its origin sits at (0,0).

        A pure coordinate translation — the pixels are untouched.
    */
    pub fn renormalized(mut self) -> Self {
        self.origin = Point::ZERO;
        self
    }
}

/**
    A decoded frame tagged with the item-relative time it represents.

    Transient: produced on demand by the media source, never cached beyond
    one tick or export slot (the pump retains only the most recent sample so
    an effect switch can republish without waiting for the next tick).
*/
#[derive(Clone, Debug)]
pub struct FrameSample {
    pub image: FrameImage,
    /// The item time at which this frame should be displayed.
    pub display_time: Duration,
}

impl FrameSample {
    pub fn new(image: FrameImage, display_time: Duration) -> Self {
        Self {
            image,
            display_time,
        }
    }
}

static_assertions::assert_impl_all!(FrameImage: Send, Sync);
static_assertions::assert_impl_all!(FrameSample: Send, Sync);
