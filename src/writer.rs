/*!
    The export frame writer.

    Re-encodes the open asset through the active effect into a new file.
    The loop runs on a dedicated worker thread so its pacing waits never
    block the display clock; progress and completion are marshalled back to
    the host queue over a channel and delivered when the host drains it.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info, warn};

use crate::effect::Effect;
use crate::error::{Error, Result};
use crate::geometry::Affine2;
use crate::library::{MediaLibrary, default_export_dir, timestamped_output_name};
use crate::observer::{ExportObserver, ObserverId, Observers};
use crate::pool::BufferPool;
use crate::pump::PlaybackPump;
use crate::render::RenderContext;
use crate::sink::{MediaSink, SinkFactory};
use crate::source::{MediaSource, SeekTolerance};

/// How often the worker re-checks a sink that is not yet ready.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/**
    Export tuning.

    The per-slot pacing sleep is the loop's explicit backpressure throttle
    against the sink's internal buffering; the original design used a fixed
    50 ms and that default is kept.
*/
#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Directory for the temporary output file.
    pub output_dir: PathBuf,
    /// Fixed wait before each frame slot.
    pub pacing: Duration,
    /// Bound on the wait for the sink's first readiness signal; a sink
    /// that never invites writing fails the job instead of wedging the
    /// worker.
    pub ready_timeout: Duration,
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pacing: Duration::from_millis(50),
            ready_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_ready_timeout(mut self, ready_timeout: Duration) -> Self {
        self.ready_timeout = ready_timeout;
        self
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new(default_export_dir())
    }
}

/**
    The result of a finished export job.
*/
#[derive(Debug)]
pub struct ExportOutcome {
    /// Frames actually appended to the sink (skipped slots excluded).
    pub frames_appended: u64,
    /// Output frame slots processed: floor(duration * frame rate).
    pub total_frame_count: u64,
    /// Finalize or persistence failure, if any. Resources are released
    /// either way.
    pub failure: Option<Error>,
}

impl ExportOutcome {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

enum ExportEvent {
    Progress(f64),
    Completed,
}

/// Everything the worker thread owns for one job.
struct ExportJob {
    sink: Box<dyn MediaSink>,
    pool: BufferPool,
    render: RenderContext,
    effect: Effect,
    orientation: Affine2,
    library: Arc<dyn MediaLibrary>,
    output_path: PathBuf,
    total_frame_count: u64,
    pacing: Duration,
    ready_timeout: Duration,
}

/**
    Entry point for starting export jobs.
*/
pub struct ExportWriter;

impl ExportWriter {
    /**
        Begin exporting the pump's open asset through its active effect.

        Sink construction happens before playback state is touched: a
        factory failure aborts the job with nothing written and the pump
        untouched. On success the pump is paused, its source handle moves
        to the worker for the duration of the job, and the returned session
        is the host-side view of the job.
    */
    pub fn begin(
        pump: &mut PlaybackPump,
        factory: &dyn SinkFactory,
        library: Arc<dyn MediaLibrary>,
        config: ExportConfig,
    ) -> Result<ExportSession> {
        if pump.is_exporting() {
            return Err(Error::ExportInProgress);
        }
        let info = pump.info().ok_or(Error::NoSource)?.clone();

        let output_path = config
            .output_dir
            .join(timestamped_output_name(factory.format(), Local::now()));
        let mut sink = factory.create(&output_path, info.width, info.height)?;

        let (mut source, info, orientation) = match pump.detach_for_export() {
            Ok(detached) => detached,
            Err(e) => {
                // The factory may already have created the output file.
                drop(sink);
                remove_temp(&output_path);
                return Err(e);
            }
        };
        source.seek(Duration::ZERO, SeekTolerance::EXACT);
        sink.start_session(Duration::ZERO);

        let total_frame_count = info.total_frame_count();
        info!(
            output = %output_path.display(),
            total_frame_count,
            "export started"
        );

        let job = ExportJob {
            sink,
            pool: BufferPool::new(info.width, info.height),
            render: RenderContext::new(),
            effect: pump.effect(),
            orientation,
            library,
            output_path: output_path.clone(),
            total_frame_count,
            pacing: config.pacing,
            ready_timeout: config.ready_timeout,
        };

        let (events_tx, events_rx) = unbounded();
        let worker = thread::spawn(move || run_export(job, source, &events_tx));

        Ok(ExportSession {
            events: events_rx,
            worker: Some(worker),
            observers: Observers::new(),
            output_path,
            total_frame_count,
            outcome: None,
        })
    }
}

/**
    Host-side handle to a running export job.

    Events are delivered only when the host drains them — call
    `pump_events` from the display queue, or `wait` to block until the job
    finishes.
*/
pub struct ExportSession {
    events: Receiver<ExportEvent>,
    worker: Option<JoinHandle<(Box<dyn MediaSource>, ExportOutcome)>>,
    observers: Observers<dyn ExportObserver>,
    output_path: PathBuf,
    total_frame_count: u64,
    outcome: Option<ExportOutcome>,
}

impl std::fmt::Debug for ExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSession")
            .field("output_path", &self.output_path)
            .field("total_frame_count", &self.total_frame_count)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl ExportSession {
    pub fn register_observer(&mut self, observer: Box<dyn ExportObserver>) -> ObserverId {
        self.observers.register(observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    pub fn total_frame_count(&self) -> u64 {
        self.total_frame_count
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&ExportOutcome> {
        self.outcome.as_ref()
    }

    /**
        Drain pending worker events, delivering them to registered
        observers on the calling thread. On completion the source handle is
        reattached to the pump. Returns true once the job has completed.

        Never blocks; intended to be called from the host's display queue.
    */
    pub fn pump_events(&mut self, pump: &mut PlaybackPump) -> bool {
        while let Ok(event) = self.events.try_recv() {
            self.deliver(event, pump);
        }
        self.is_complete()
    }

    /**
        Block until the job completes, delivering events as they arrive.
    */
    pub fn wait(mut self, pump: &mut PlaybackPump) -> ExportOutcome {
        while !self.is_complete() {
            match self.events.recv() {
                Ok(event) => self.deliver(event, pump),
                // Worker gone without a completion event: treat as complete.
                Err(_) => self.finish(pump),
            }
        }
        self.outcome.take().expect("completed export has an outcome")
    }

    fn deliver(&mut self, event: ExportEvent, pump: &mut PlaybackPump) {
        match event {
            ExportEvent::Progress(fraction) => {
                for observer in self.observers.iter() {
                    observer.export_progress(fraction);
                }
            }
            ExportEvent::Completed => self.finish(pump),
        }
    }

    /// Join the worker, hand the source handle back, notify completion.
    fn finish(&mut self, pump: &mut PlaybackPump) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        match worker.join() {
            Ok((source, outcome)) => {
                pump.reattach_after_export(source);
                for observer in self.observers.iter() {
                    observer.export_complete(&outcome);
                }
                self.outcome = Some(outcome);
            }
            Err(_) => {
                warn!("export worker panicked, source handle lost");
                pump.abandon_export();
                self.outcome = Some(ExportOutcome {
                    frames_appended: 0,
                    total_frame_count: self.total_frame_count,
                    failure: Some(Error::persistence("export worker panicked")),
                });
            }
        }
    }
}

/**
    The export loop. Runs on the dedicated worker thread; owns the source
    handle and every job resource until completion.
*/
fn run_export(
    mut job: ExportJob,
    mut source: Box<dyn MediaSource>,
    events: &Sender<ExportEvent>,
) -> (Box<dyn MediaSource>, ExportOutcome) {
    let total = job.total_frame_count;

    // The sink invites writing on its own cadence; wait for the first
    // invitation, bounded so a wedged sink cannot park the worker forever.
    let ready_deadline = Instant::now() + job.ready_timeout;
    while !job.sink.ready_for_more() {
        if Instant::now() >= ready_deadline {
            warn!(
                output = %job.output_path.display(),
                "sink never became ready, giving up"
            );
            remove_temp(&job.output_path);
            let outcome = ExportOutcome {
                frames_appended: 0,
                total_frame_count: total,
                failure: Some(Error::sink_unresponsive(
                    "no readiness signal before the deadline",
                )),
            };
            let _ = events.send(ExportEvent::Completed);
            return (source, outcome);
        }
        thread::sleep(READY_POLL_INTERVAL);
    }

    let mut frames_appended = 0u64;

    for index in 0..total {
        thread::sleep(job.pacing);
        let _ = events.send(ExportEvent::Progress(index as f64 / total as f64));

        let read_time = source.current_read_time();
        if source.has_frame_at(read_time) {
            if let Some(sample) = source.copy_frame_at(read_time) {
                // Orientation correction can shift the content origin;
                // the sink requires a zero-origined buffer, so renormalize
                // before the effect and the render.
                let image = job.render.apply_transform(sample.image, &job.orientation);
                let image = image.renormalized();
                let image = job.effect.apply(image);

                let mut buffer = job.pool.draw();
                job.render.render_into(&image, buffer.image_mut());
                if job.sink.append(buffer.image(), sample.display_time) {
                    frames_appended += 1;
                } else {
                    warn!(slot = index, "sink rejected frame");
                }
            }
        } else {
            // Non-fatal: the slot is skipped, the output stays on its
            // nominal duration with a gap.
            debug!(slot = index, "no frame ready, slot skipped");
        }

        // One frame of read-position advance per slot, produced or not.
        source.advance(1);
    }

    job.sink.mark_finished();
    let finalized = job.sink.finalize();

    // The job is done with the read position; park it back at the start
    // before the handle returns to playback.
    source.seek(Duration::ZERO, SeekTolerance::EXACT);

    let failure = match finalized {
        Ok(()) => match job.library.save(&job.output_path) {
            Ok(()) => None,
            Err(e) => {
                warn!("persistence failed: {e}");
                Some(e)
            }
        },
        Err(e) => {
            warn!("sink finalize failed: {e}");
            Some(e)
        }
    };

    // The temporary file goes away whether or not the library accepted it.
    remove_temp(&job.output_path);

    let outcome = ExportOutcome {
        frames_appended,
        total_frame_count: total,
        failure,
    };
    info!(
        frames_appended,
        total_frame_count = total,
        succeeded = outcome.succeeded(),
        "export finished"
    );
    let _ = events.send(ExportEvent::Completed);
    (source, outcome)
}

/// Remove the temporary output file if one was created.
fn remove_temp(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(output = %path.display(), "failed to remove temporary output: {e}");
        }
    }
}

static_assertions::assert_impl_all!(ExportEvent: Send);
static_assertions::assert_impl_all!(ExportOutcome: Send);
