/*!
    Frame rendering.

    `RenderContext` is the explicitly owned rendering seam: the playback
    pump and each export job construct and hold their own instance instead
    of sharing a lazily-initialized global. It applies orientation
    correction to frames, tracking how the transform moves the content
    extent, and resolves frames into flat RGBA buffers for display or for
    the sink-bound copy.
*/

use image::{RgbaImage, imageops};
use tracing::warn;

use crate::frame::FrameImage;
use crate::geometry::{Affine2, Orientation};

/**
    Applies transforms and renders frames to output buffers.
*/
#[derive(Debug, Default)]
pub struct RenderContext {
    _private: (),
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Apply an affine transform to a frame.

        The pixel operation is chosen from the transform's orthogonal
        classification; the content extent is mapped through the full
        affine, so the resulting origin may be non-zero (callers bound for
        a sink must renormalize before rendering). Non-orthogonal
        transforms keep their pixels and only move the extent.
    */
    pub fn apply_transform(&self, frame: FrameImage, transform: &Affine2) -> FrameImage {
        let extent = transform.map_rect(frame.extent());

        let pixels = match transform.orientation() {
            Some(Orientation::Identity) => frame.pixels,
            Some(Orientation::QuarterCw) => imageops::rotate90(&frame.pixels),
            Some(Orientation::Half) => imageops::rotate180(&frame.pixels),
            Some(Orientation::QuarterCcw) => imageops::rotate270(&frame.pixels),
            Some(Orientation::FlipHorizontal) => imageops::flip_horizontal(&frame.pixels),
            Some(Orientation::FlipVertical) => imageops::flip_vertical(&frame.pixels),
            Some(Orientation::Transpose) => {
                imageops::flip_horizontal(&imageops::rotate90(&frame.pixels))
            }
            Some(Orientation::AntiTranspose) => {
                imageops::flip_vertical(&imageops::rotate90(&frame.pixels))
            }
            None => {
                warn!("non-orthogonal orientation transform, pixels left unrotated");
                frame.pixels
            }
        };

        FrameImage::with_origin(pixels, extent.origin)
    }

    /**
        Resolve a frame into a displayable image.

        The display surface only cares about the content, so the extent
        origin is dropped.
    */
    pub fn resolve(&self, frame: &FrameImage) -> RgbaImage {
        frame.pixels.clone()
    }

    /**
        Render a frame into a sink-bound buffer.

        The frame must have been renormalized to a zero origin first; the
        content is copied to the buffer's top-left corner and cropped to
        the buffer's size if larger.
    */
    pub fn render_into(&self, frame: &FrameImage, target: &mut RgbaImage) {
        debug_assert!(
            frame.has_zero_origin(),
            "sink-bound frames must be renormalized to a zero origin"
        );
        imageops::replace(target, &frame.pixels, 0, 0);
    }
}
