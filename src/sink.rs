/*!
    The consumed media-sink interface.

    A `MediaSink` accepts rendered frames at presentation timestamps and
    produces a container file when finalized. Real codec backends implement
    these traits; the crate ships `FrameStreamSink`, an uncompressed
    development sink, so the export path can run end to end without a codec
    stack.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use image::RgbaImage;
use tracing::warn;

use crate::error::{Error, Result};

/**
    Container format for output files.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Mp4,
    Mkv,
    /// Uncompressed length-prefixed RGBA frame stream.
    FrameStream,
}

impl ContainerFormat {
    /**
        The file extension for this container.
    */
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::FrameStream => "fvs",
        }
    }
}

/**
    A sink for rendered frames.

    Lifecycle: `start_session`, any number of `append`s while
    `ready_for_more`, then `mark_finished` and `finalize`. Appends are paced
    by the caller; a sink with internal buffering reports backpressure by
    returning false from `ready_for_more`.
*/
pub trait MediaSink: Send {
    fn format(&self) -> ContainerFormat;

    /// Begin the write session at the given source time.
    fn start_session(&mut self, at: Duration);

    /// Whether the sink is ready to accept more data.
    fn ready_for_more(&self) -> bool;

    /// Append a frame at its presentation timestamp. Returns false if the
    /// frame was rejected (session not started, already finished, or a
    /// write failure).
    fn append(&mut self, frame: &RgbaImage, presentation_time: Duration) -> bool;

    /// No more frames will be appended.
    fn mark_finished(&mut self);

    /// Flush and finalize the container.
    fn finalize(&mut self) -> Result<()>;
}

/**
    Creates sinks for export jobs.

    Construction failures are fatal to the job and must surface before any
    frame is written: `Error::UnsupportedOutputSettings` for rejected
    dimensions, `Error::SinkCreation` for everything else.
*/
pub trait SinkFactory: Send + Sync {
    fn format(&self) -> ContainerFormat;
    fn create(&self, output: &Path, width: u32, height: u32) -> Result<Box<dyn MediaSink>>;
}

/// Magic bytes at the start of a frame-stream file.
pub const FRAME_STREAM_MAGIC: &[u8; 4] = b"FVS1";

/**
    Uncompressed frame-stream sink.

    File layout: magic, u32 width, u32 height (little endian), then one
    record per frame: u64 presentation time in microseconds, u32 payload
    length, raw RGBA bytes.
*/
#[derive(Debug)]
pub struct FrameStreamSink {
    writer: BufWriter<File>,
    started: bool,
    finished: bool,
    frames_written: u64,
}

impl FrameStreamSink {
    /**
        Create the output file and write the stream header.
    */
    pub fn create(output: &Path, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::unsupported_settings(format!(
                "frame stream requires non-zero dimensions, got {width}x{height}"
            )));
        }

        let file = File::create(output)
            .map_err(|e| Error::sink_creation(format!("{}: {e}", output.display())))?;
        let mut writer = BufWriter::new(file);

        writer.write_all(FRAME_STREAM_MAGIC)?;
        writer.write_all(&width.to_le_bytes())?;
        writer.write_all(&height.to_le_bytes())?;

        Ok(Self {
            writer,
            started: false,
            finished: false,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl MediaSink for FrameStreamSink {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::FrameStream
    }

    fn start_session(&mut self, _at: Duration) {
        self.started = true;
    }

    fn ready_for_more(&self) -> bool {
        self.started && !self.finished
    }

    fn append(&mut self, frame: &RgbaImage, presentation_time: Duration) -> bool {
        if !self.started || self.finished {
            warn!("append outside an active session, frame dropped");
            return false;
        }

        let pts_micros = presentation_time.as_micros() as u64;
        let payload = frame.as_raw();
        let result = self
            .writer
            .write_all(&pts_micros.to_le_bytes())
            .and_then(|()| self.writer.write_all(&(payload.len() as u32).to_le_bytes()))
            .and_then(|()| self.writer.write_all(payload));

        match result {
            Ok(()) => {
                self.frames_written += 1;
                true
            }
            Err(e) => {
                warn!("frame write failed: {e}");
                false
            }
        }
    }

    fn mark_finished(&mut self) {
        self.finished = true;
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/**
    Factory for `FrameStreamSink`.
*/
#[derive(Debug, Default)]
pub struct FrameStreamSinkFactory;

impl SinkFactory for FrameStreamSinkFactory {
    fn format(&self) -> ContainerFormat {
        ContainerFormat::FrameStream
    }

    fn create(&self, output: &Path, width: u32, height: u32) -> Result<Box<dyn MediaSink>> {
        Ok(Box::new(FrameStreamSink::create(output, width, height)?))
    }
}

static_assertions::assert_impl_all!(Box<dyn MediaSink>: Send);
