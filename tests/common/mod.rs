//! Scripted media source, sink, and observer doubles shared by the
//! integration suites.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};

use vidfx::{
    ContainerFormat, Error, ExportObserver, ExportOutcome, FrameImage, FrameSample, MediaInfo,
    MediaLibrary, MediaOpener, MediaSink, MediaSource, PlaybackObserver, Result, SeekTolerance,
    SinkFactory,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Counters shared between a test and the sources its opener produces.
#[derive(Default)]
pub struct SourceProbe {
    pub opens: AtomicUsize,
    pub open_locators: Mutex<Vec<PathBuf>>,
    pub advances: AtomicU64,
    pub seeks: Mutex<Vec<Duration>>,
    pub copies: AtomicU64,
    pub play_states: Mutex<Vec<bool>>,
}

/// A deterministic in-memory video asset.
pub struct ScriptedSource {
    info: MediaInfo,
    read_time: Duration,
    /// Frame indices with no buffer available (export skip slots).
    miss_slots: HashSet<u64>,
    /// Playback stall scenario: no tick ever finds a new buffer.
    always_miss: bool,
    probe: Arc<SourceProbe>,
}

impl ScriptedSource {
    fn frame_index_at(&self, time: Duration) -> u64 {
        // Nudge past the rounding error accumulated by repeated one-frame
        // advances so slot boundaries resolve to the intended index.
        let index = (time.as_secs_f64() * self.info.nominal_frame_rate + 1e-4).floor() as u64;
        index.min(self.info.total_frame_count().saturating_sub(1))
    }
}

impl MediaSource for ScriptedSource {
    fn info(&self) -> &MediaInfo {
        &self.info
    }

    fn seek(&mut self, target: Duration, _tolerance: SeekTolerance) {
        self.probe.seeks.lock().unwrap().push(target);
        self.read_time = target;
    }

    fn has_frame_at(&self, time: Duration) -> bool {
        if self.always_miss || time > self.info.duration {
            return false;
        }
        !self.miss_slots.contains(&self.frame_index_at(time))
    }

    fn copy_frame_at(&mut self, time: Duration) -> Option<FrameSample> {
        if !self.has_frame_at(time) {
            return None;
        }
        self.probe.copies.fetch_add(1, Ordering::Relaxed);
        let index = self.frame_index_at(time);

        // Encode the frame index in the red channel so tests can identify
        // which frame landed where.
        let mut pixels = RgbaImage::new(self.info.width, self.info.height);
        for pixel in pixels.pixels_mut() {
            *pixel = Rgba([(index % 256) as u8, 0, 0, 255]);
        }

        let display_time = Duration::from_secs_f64(index as f64 / self.info.nominal_frame_rate);
        Some(FrameSample::new(FrameImage::new(pixels), display_time))
    }

    fn current_read_time(&self) -> Duration {
        self.read_time
    }

    fn advance(&mut self, frame_count: u64) {
        self.probe.advances.fetch_add(frame_count, Ordering::Relaxed);
        let step = Duration::from_secs_f64(frame_count as f64 / self.info.nominal_frame_rate);
        self.read_time += step;
    }

    fn set_playing(&mut self, playing: bool) {
        self.probe.play_states.lock().unwrap().push(playing);
    }
}

/// Opener producing `ScriptedSource`s that all report to one probe.
pub struct ScriptedOpener {
    pub info: MediaInfo,
    pub miss_slots: HashSet<u64>,
    pub always_miss: bool,
    pub fail_open: bool,
    pub probe: Arc<SourceProbe>,
}

impl ScriptedOpener {
    pub fn new(info: MediaInfo) -> Self {
        Self {
            info,
            miss_slots: HashSet::new(),
            always_miss: false,
            fail_open: false,
            probe: Arc::new(SourceProbe::default()),
        }
    }
}

impl MediaOpener for ScriptedOpener {
    fn open(&self, locator: &Path) -> Result<Box<dyn MediaSource>> {
        self.probe.opens.fetch_add(1, Ordering::Relaxed);
        self.probe
            .open_locators
            .lock()
            .unwrap()
            .push(locator.to_path_buf());
        if self.fail_open {
            return Err(Error::unopenable(format!(
                "no video track in {}",
                locator.display()
            )));
        }
        Ok(Box::new(ScriptedSource {
            info: self.info.clone(),
            read_time: Duration::ZERO,
            miss_slots: self.miss_slots.clone(),
            always_miss: self.always_miss,
            probe: Arc::clone(&self.probe),
        }))
    }
}

/// Records everything the pump publishes.
#[derive(Default)]
pub struct PlaybackRecorder {
    pub frames: Mutex<Vec<(u32, u32, [u8; 4])>>,
    pub positions: Mutex<Vec<f64>>,
}

/// Local newtype so the integration crate can implement the foreign
/// observer traits for shared recorders (the orphan rule forbids
/// implementing them on `Arc<Recorder>` directly).
pub struct Observe<T>(pub Arc<T>);

impl PlaybackObserver for Observe<PlaybackRecorder> {
    fn frame_rendered(&self, image: &RgbaImage) {
        let pixel = image.get_pixel(0, 0).0;
        self.0
            .frames
            .lock()
            .unwrap()
            .push((image.width(), image.height(), pixel));
    }

    fn position_changed(&self, normalized: f64) {
        self.0.positions.lock().unwrap().push(normalized);
    }
}

/// Records export progress and completion.
#[derive(Default)]
pub struct ExportRecorder {
    pub progress: Mutex<Vec<f64>>,
    pub completions: AtomicUsize,
    pub last_succeeded: Mutex<Option<bool>>,
}

impl ExportObserver for Observe<ExportRecorder> {
    fn export_progress(&self, fraction: f64) {
        self.0.progress.lock().unwrap().push(fraction);
    }

    fn export_complete(&self, outcome: &ExportOutcome) {
        self.0.completions.fetch_add(1, Ordering::Relaxed);
        *self.0.last_succeeded.lock().unwrap() = Some(outcome.succeeded());
    }
}

/// A sink that records appends instead of writing a file.
#[derive(Default)]
pub struct SinkProbe {
    pub appends: Mutex<Vec<(u32, u32, Duration, [u8; 4])>>,
    pub sessions: AtomicUsize,
    pub finalizes: AtomicUsize,
}

pub struct RecordingSink {
    probe: Arc<SinkProbe>,
    started: bool,
    finished: bool,
}

impl MediaSink for RecordingSink {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn start_session(&mut self, _at: Duration) {
        self.probe.sessions.fetch_add(1, Ordering::Relaxed);
        self.started = true;
    }

    fn ready_for_more(&self) -> bool {
        self.started && !self.finished
    }

    fn append(&mut self, frame: &RgbaImage, presentation_time: Duration) -> bool {
        if !self.ready_for_more() {
            return false;
        }
        self.probe.appends.lock().unwrap().push((
            frame.width(),
            frame.height(),
            presentation_time,
            frame.get_pixel(0, 0).0,
        ));
        true
    }

    fn mark_finished(&mut self) {
        self.finished = true;
    }

    fn finalize(&mut self) -> Result<()> {
        self.probe.finalizes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// How a `RecordingSinkFactory` should misbehave.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SinkFailure {
    Creation,
    Settings,
}

pub struct RecordingSinkFactory {
    pub probe: Arc<SinkProbe>,
    pub failure: Option<SinkFailure>,
}

impl RecordingSinkFactory {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(SinkProbe::default()),
            failure: None,
        }
    }
}

impl SinkFactory for RecordingSinkFactory {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn create(&self, _output: &Path, width: u32, height: u32) -> Result<Box<dyn MediaSink>> {
        match self.failure {
            Some(SinkFailure::Creation) => Err(Error::sink_creation("scripted failure")),
            Some(SinkFailure::Settings) => {
                Err(Error::unsupported_settings(format!("{width}x{height}")))
            }
            None => Ok(Box::new(RecordingSink {
                probe: Arc::clone(&self.probe),
                started: false,
                finished: false,
            })),
        }
    }
}

/// A sink that never invites writing.
pub struct StalledSink;

impl MediaSink for StalledSink {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn start_session(&mut self, _at: Duration) {}

    fn ready_for_more(&self) -> bool {
        false
    }

    fn append(&mut self, _frame: &RgbaImage, _presentation_time: Duration) -> bool {
        false
    }

    fn mark_finished(&mut self) {}

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct StalledSinkFactory;

impl SinkFactory for StalledSinkFactory {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn create(&self, _output: &Path, _width: u32, _height: u32) -> Result<Box<dyn MediaSink>> {
        Ok(Box::new(StalledSink))
    }
}

/// A sink that panics on the first readiness poll, taking the export
/// worker thread down with it.
pub struct PanickingSink;

impl MediaSink for PanickingSink {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn start_session(&mut self, _at: Duration) {}

    fn ready_for_more(&self) -> bool {
        panic!("scripted sink panic");
    }

    fn append(&mut self, _frame: &RgbaImage, _presentation_time: Duration) -> bool {
        false
    }

    fn mark_finished(&mut self) {}

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct PanickingSinkFactory;

impl SinkFactory for PanickingSinkFactory {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::Mp4
    }

    fn create(&self, _output: &Path, _width: u32, _height: u32) -> Result<Box<dyn MediaSink>> {
        Ok(Box::new(PanickingSink))
    }
}

/// A library that records saves and can be told to reject them.
#[derive(Default)]
pub struct RecordingLibrary {
    pub saves: Mutex<Vec<PathBuf>>,
    pub reject: bool,
}

impl MediaLibrary for RecordingLibrary {
    fn save(&self, path: &Path) -> Result<()> {
        self.saves.lock().unwrap().push(path.to_path_buf());
        if self.reject {
            Err(Error::persistence("scripted rejection"))
        } else {
            Ok(())
        }
    }
}

/// A 10 second, 30 fps, 4x4 asset with an upright track.
pub fn default_info() -> MediaInfo {
    MediaInfo {
        duration: Duration::from_secs(10),
        nominal_frame_rate: 30.0,
        width: 4,
        height: 4,
        preferred_transform: vidfx::Affine2::IDENTITY,
    }
}
