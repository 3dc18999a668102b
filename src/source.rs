/*!
    The consumed media-source interface.

    A `MediaSource` is one opened video asset: it owns the read/seek
    position and vends decoded frames on demand. The pipeline never decodes
    anything itself — decoding backends implement these traits.
*/

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::frame::FrameSample;
use crate::geometry::Affine2;

/**
    Seek tolerance around a target time.

    `EXACT` (zero before and after) requests a frame-accurate seek.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekTolerance {
    pub before: Duration,
    pub after: Duration,
}

impl SeekTolerance {
    /// Frame-accurate: land exactly on the requested time.
    pub const EXACT: Self = Self {
        before: Duration::ZERO,
        after: Duration::ZERO,
    };

    pub fn new(before: Duration, after: Duration) -> Self {
        Self { before, after }
    }
}

/**
    Static properties of an opened asset's video track.
*/
#[derive(Clone, Debug)]
pub struct MediaInfo {
    pub duration: Duration,
    /// Frames per second as declared by the track.
    pub nominal_frame_rate: f64,
    /// Presentation width in pixels.
    pub width: u32,
    /// Presentation height in pixels.
    pub height: u32,
    /// The track's preferred display transform. The pipeline applies its
    /// inverse as orientation correction.
    pub preferred_transform: Affine2,
}

impl MediaInfo {
    /**
        Number of output frame slots for a full-length export:
        floor(duration_seconds * nominal_frame_rate).
    */
    pub fn total_frame_count(&self) -> u64 {
        (self.duration.as_secs_f64() * self.nominal_frame_rate).floor() as u64
    }

    /**
        Duration of a single frame at the nominal rate.
    */
    pub fn frame_duration(&self) -> Duration {
        if self.nominal_frame_rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / self.nominal_frame_rate)
    }
}

/**
    One opened video asset.

    The read/seek position is exclusively owned by whichever subsystem
    currently holds playback control; the export writer takes the boxed
    source for the duration of a job and returns it afterward.
*/
pub trait MediaSource: Send {
    /// Static track properties.
    fn info(&self) -> &MediaInfo;

    /// Move the read position to `target` within the given tolerance.
    fn seek(&mut self, target: Duration, tolerance: SeekTolerance);

    /// Whether a new decoded buffer is ready for the given item time.
    fn has_frame_at(&self, time: Duration) -> bool;

    /// Copy the decoded buffer due at `time`, tagged with its display time.
    /// Returns None when no new buffer is available.
    fn copy_frame_at(&mut self, time: Duration) -> Option<FrameSample>;

    /// The current read position.
    fn current_read_time(&self) -> Duration;

    /// Step the read position forward by `frame_count` frames.
    fn advance(&mut self, frame_count: u64);

    /// Start or stop the source's own playback (decode-ahead) machinery.
    fn set_playing(&mut self, playing: bool);
}

/**
    Resolves a locator to an opened `MediaSource`.

    Fails with `Error::UnopenableSource` when the locator does not resolve
    to a readable asset with a video track. The pump keeps the opener for
    the lifetime of the pipeline so a stalled source can be reopened with
    the original locator.
*/
pub trait MediaOpener: Send + Sync {
    fn open(&self, locator: &Path) -> Result<Box<dyn MediaSource>>;
}

static_assertions::assert_impl_all!(MediaInfo: Send, Sync);
static_assertions::assert_impl_all!(Box<dyn MediaSource>: Send);
