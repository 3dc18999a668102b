/*!
    The consumed image-transform capability.

    An effect is a pure per-frame transform: the pipeline treats it as
    opaque, swappable at any time, visible on the next produced frame. A
    small built-in set is enough to exercise the seam; `"none"` is the
    identity.
*/

use image::Rgba;

use crate::frame::FrameImage;

/**
    A named visual effect.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Effect {
    /// Identity — frames pass through untouched.
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
}

impl Effect {
    /**
        Look up an effect by name. Unknown names return None.
    */
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "grayscale" => Some(Self::Grayscale),
            "sepia" => Some(Self::Sepia),
            "invert" => Some(Self::Invert),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Invert => "invert",
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::None)
    }

    /**
        Apply the effect to a frame. The content extent (including a
        non-zero origin) is preserved.
    */
    pub fn apply(&self, mut frame: FrameImage) -> FrameImage {
        match self {
            Self::None => frame,
            Self::Grayscale => {
                for pixel in frame.pixels.pixels_mut() {
                    let Rgba([r, g, b, a]) = *pixel;
                    let luma = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b))
                        .round() as u8;
                    *pixel = Rgba([luma, luma, luma, a]);
                }
                frame
            }
            Self::Sepia => {
                for pixel in frame.pixels.pixels_mut() {
                    let Rgba([r, g, b, a]) = *pixel;
                    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
                    let sr = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0) as u8;
                    let sg = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0) as u8;
                    let sb = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0) as u8;
                    *pixel = Rgba([sr, sg, sb, a]);
                }
                frame
            }
            Self::Invert => {
                image::imageops::invert(&mut frame.pixels);
                frame
            }
        }
    }
}
