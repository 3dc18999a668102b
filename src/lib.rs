/*!
    Filtered video frame pipeline.

    Two cooperating subsystems over the same opened asset and the same
    image effect, running under different scheduling regimes:

    - **Playback frame pump** — driven by a periodic host tick; each tick
      fetches the frame due at the current item time, applies the active
      effect and orientation correction, and publishes a displayable image
      plus a normalized position. Stalled delivery self-heals by reopening
      the source.
    - **Export frame writer** — paced by the media sink's own readiness;
      walks every output frame slot on a dedicated worker thread,
      transforms each available frame into a pooled sink-compatible buffer,
      appends it at its original presentation timestamp, and hands the
      finalized file to a media library.

    Decoding, encoding, and persistence are consumed through the
    [`MediaSource`], [`MediaSink`], and [`MediaLibrary`] traits — the
    pipeline owns the loops, not the codecs.

    # Basic Usage

    ```ignore
    use std::sync::Arc;
    use vidfx::{
        Effect, ExportConfig, ExportWriter, FolderLibrary, FrameStreamSinkFactory,
        PlaybackPump, RenderContext,
    };

    let mut pump = PlaybackPump::new(opener, RenderContext::new());
    pump.open("clip.mov")?;
    pump.register_observer(Box::new(view_model));
    pump.set_effect(Effect::Sepia);
    pump.set_paused(false);

    // On every display refresh:
    pump.tick(std::time::Instant::now());

    // Offline filtered re-encode:
    let library = Arc::new(FolderLibrary::in_default_location()?);
    let mut session = ExportWriter::begin(
        &mut pump,
        &FrameStreamSinkFactory,
        library,
        ExportConfig::default(),
    )?;
    // On the display queue, until complete:
    session.pump_events(&mut pump);
    ```
*/

mod clock;
mod effect;
mod error;
mod frame;
mod geometry;
mod library;
mod observer;
mod pool;
mod pump;
mod render;
mod sink;
mod source;
mod writer;

pub use clock::PlaybackClock;
pub use effect::Effect;
pub use error::{Error, Result};
pub use frame::{FrameImage, FrameSample};
pub use geometry::{Affine2, Orientation, Point, Rect};
pub use library::{FolderLibrary, MediaLibrary, default_export_dir, timestamped_output_name};
pub use observer::{ExportObserver, ObserverId, Observers, PlaybackObserver};
pub use pool::{BufferPool, PooledBuffer};
pub use pump::PlaybackPump;
pub use render::RenderContext;
pub use sink::{
    ContainerFormat, FRAME_STREAM_MAGIC, FrameStreamSink, FrameStreamSinkFactory, MediaSink,
    SinkFactory,
};
pub use source::{MediaInfo, MediaOpener, MediaSource, SeekTolerance};
pub use writer::{ExportConfig, ExportOutcome, ExportSession, ExportWriter};
