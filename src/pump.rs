/*!
    The playback frame pump.

    Driven by a periodic host tick: each tick maps the host instant to item
    time, fetches the frame due at that time, runs it through the active
    effect and orientation correction, and publishes a displayable image
    plus a normalized position. Stalled delivery (12+ consecutive ticks
    with no new buffer while unpaused) is recovered by reopening the
    original locator.
*/

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clock::PlaybackClock;
use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::frame::FrameSample;
use crate::geometry::Affine2;
use crate::observer::{ObserverId, Observers, PlaybackObserver};
use crate::render::RenderContext;
use crate::source::{MediaInfo, MediaOpener, MediaSource, SeekTolerance};

/// Consecutive fetch misses tolerated before the source is considered
/// stalled and reopened.
const STALL_MISS_THRESHOLD: u32 = 12;

/**
    Clock-driven playback of a filtered video preview.
*/
pub struct PlaybackPump {
    opener: Arc<dyn MediaOpener>,
    render: RenderContext,
    observers: Observers<dyn PlaybackObserver>,
    locator: Option<PathBuf>,
    source: Option<Box<dyn MediaSource>>,
    info: Option<MediaInfo>,
    /// Inverse of the track's preferred transform.
    orientation: Affine2,
    clock: PlaybackClock,
    effect: Effect,
    paused: bool,
    miss_count: u32,
    last_sample: Option<FrameSample>,
    exporting: bool,
}

impl PlaybackPump {
    pub fn new(opener: Arc<dyn MediaOpener>, render: RenderContext) -> Self {
        Self {
            opener,
            render,
            observers: Observers::new(),
            locator: None,
            source: None,
            info: None,
            orientation: Affine2::IDENTITY,
            clock: PlaybackClock::new(Instant::now()),
            effect: Effect::None,
            paused: true,
            miss_count: 0,
            last_sample: None,
            exporting: false,
        }
    }

    /**
        Open (or reopen) the asset at `locator`, replacing any current
        handle wholesale. Leaves the pump paused at position zero with the
        miss count reset.
    */
    pub fn open(&mut self, locator: impl Into<PathBuf>) -> Result<()> {
        let locator = locator.into();
        let source = self.opener.open(&locator)?;
        let info = source.info().clone();

        self.orientation = info
            .preferred_transform
            .invert()
            .unwrap_or(Affine2::IDENTITY);
        info!(
            locator = %locator.display(),
            duration_secs = info.duration.as_secs_f64(),
            frame_rate = info.nominal_frame_rate,
            "opened source"
        );

        self.locator = Some(locator);
        self.source = Some(source);
        self.info = Some(info);
        self.miss_count = 0;
        self.last_sample = None;
        self.paused = true;
        self.clock = PlaybackClock::new(Instant::now());
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn info(&self) -> Option<&MediaInfo> {
        self.info.as_ref()
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.miss_count
    }

    pub fn register_observer(&mut self, observer: Box<dyn PlaybackObserver>) -> ObserverId {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /**
        Seek to a normalized position in [0, 1] with zero tolerance and
        immediately attempt one fetch/publish so the display reflects the
        new position without waiting for the next tick.
    */
    pub fn set_position(&mut self, normalized: f64) {
        let Some(info) = self.info.clone() else {
            return;
        };
        if self.source.is_none() {
            return;
        }

        let normalized = normalized.clamp(0.0, 1.0);
        let target = info.duration.mul_f64(normalized);

        if let Some(source) = self.source.as_mut() {
            source.seek(target, SeekTolerance::EXACT);
        }
        self.clock.reset_to(Instant::now(), target);
        self.fetch_frame_at(target);
    }

    /**
        One playback tick. Must complete within the host refresh interval;
        does nothing while paused.
    */
    pub fn tick(&mut self, host_now: Instant) {
        if self.paused || self.source.is_none() {
            return;
        }
        let Some(info) = self.info.clone() else {
            return;
        };

        let item_time = self.clock.position_at(host_now).min(info.duration);
        self.fetch_frame_at(item_time);

        let normalized = if info.duration.is_zero() {
            1.0
        } else {
            item_time.as_secs_f64() / info.duration.as_secs_f64()
        };
        for observer in self.observers.iter() {
            observer.position_changed(normalized);
        }

        if normalized >= 1.0 {
            debug!("reached end of item, pausing");
            self.set_paused(true);
        }
    }

    /**
        Pause or resume both the tick clock and the underlying source.
        Idempotent.
    */
    pub fn set_paused(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;

        let now = Instant::now();
        if paused {
            self.clock.pause(now);
        } else {
            self.clock.resume(now);
        }
        if let Some(source) = self.source.as_mut() {
            source.set_playing(!paused);
        }
    }

    /**
        Replace the active effect. If a previously fetched frame exists it
        is immediately re-rendered and republished, so switching effects
        updates the display without waiting for a tick.
    */
    pub fn set_effect(&mut self, effect: Effect) {
        self.effect = effect;
        if self.last_sample.is_some() {
            self.publish_current();
        }
    }

    /**
        Fetch and publish the frame due at `time`, counting misses and
        reopening a stalled source.
    */
    fn fetch_frame_at(&mut self, time: Duration) {
        let (available, sample) = match self.source.as_mut() {
            Some(source) if source.has_frame_at(time) => (true, source.copy_frame_at(time)),
            Some(_) => (false, None),
            None => return,
        };

        if available {
            self.miss_count = 0;
            if let Some(sample) = sample {
                self.last_sample = Some(sample);
                self.publish_current();
            }
        } else if !self.paused {
            self.miss_count += 1;
            if self.miss_count > STALL_MISS_THRESHOLD {
                self.reopen_stalled();
            }
        }
        // A miss while paused is expected (e.g. right after a scrub) and
        // is not counted.
    }

    fn reopen_stalled(&mut self) {
        let Some(locator) = self.locator.clone() else {
            return;
        };
        warn!(
            locator = %locator.display(),
            misses = self.miss_count,
            "source stalled, reopening"
        );
        if let Err(e) = self.open(&locator) {
            warn!("reopen failed: {e}");
        }
    }

    /**
        Render the retained sample through the current effect and
        orientation correction and publish it.
    */
    fn publish_current(&self) {
        let Some(sample) = self.last_sample.as_ref() else {
            return;
        };

        let image = self.effect.apply(sample.image.clone());
        let image = self.render.apply_transform(image, &self.orientation);
        let display = self.render.resolve(&image);

        for observer in self.observers.iter() {
            observer.frame_rendered(&display);
        }
    }

    /**
        Detach the source handle for an export job, pausing playback
        first. The export writer owns the read position until the handle
        is reattached.
    */
    pub(crate) fn detach_for_export(&mut self) -> Result<(Box<dyn MediaSource>, MediaInfo, Affine2)> {
        if self.exporting {
            return Err(Error::ExportInProgress);
        }
        self.set_paused(true);
        let source = self.source.take().ok_or(Error::NoSource)?;
        let info = self.info.clone().ok_or(Error::NoSource)?;
        self.exporting = true;
        Ok((source, info, self.orientation))
    }

    /**
        Return the source handle after an export job completes or fails.
    */
    pub(crate) fn reattach_after_export(&mut self, source: Box<dyn MediaSource>) {
        self.source = Some(source);
        self.exporting = false;
    }

    /// Clear the export flag when the job can no longer return the handle.
    pub(crate) fn abandon_export(&mut self) {
        self.exporting = false;
    }
}
