/*!
    Error types for the frame pipeline.
*/

use thiserror::Error;

/**
    Error type for the frame pipeline.

    Fatal conditions (unopenable sources, sink construction failures) abort
    the operation that raised them and are surfaced to the caller. Per-frame
    fetch misses are not errors — they are absorbed by the playback and
    export loops and never appear here.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// The source locator could not be resolved to a decodable asset with a
    /// video track.
    #[error("unopenable source: {message}")]
    UnopenableSource { message: String },

    /// The media sink could not be constructed.
    #[error("sink creation failed: {message}")]
    SinkCreation { message: String },

    /// The sink rejected the requested output settings (e.g. a zero-sized
    /// presentation).
    #[error("unsupported output settings: {message}")]
    UnsupportedOutputSettings { message: String },

    /// The sink never signaled readiness for data, so the export job gave
    /// up without writing any frames.
    #[error("sink unresponsive: {message}")]
    SinkUnresponsive { message: String },

    /// Handing the finished file to the media library failed. Reported to
    /// the caller but never blocks releasing export resources.
    #[error("persistence failed: {message}")]
    Persistence { message: String },

    /// An export job is already running against the open handle.
    #[error("an export is already in progress")]
    ExportInProgress,

    /// No source is currently open.
    #[error("no source is open")]
    NoSource,

    /// I/O error (file not found, write failure, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /**
        Create an unopenable-source error with the given message.
    */
    pub fn unopenable(message: impl Into<String>) -> Self {
        Self::UnopenableSource {
            message: message.into(),
        }
    }

    /**
        Create a sink-creation error with the given message.
    */
    pub fn sink_creation(message: impl Into<String>) -> Self {
        Self::SinkCreation {
            message: message.into(),
        }
    }

    /**
        Create an unsupported-output-settings error with the given message.
    */
    pub fn unsupported_settings(message: impl Into<String>) -> Self {
        Self::UnsupportedOutputSettings {
            message: message.into(),
        }
    }

    /**
        Create a sink-unresponsive error with the given message.
    */
    pub fn sink_unresponsive(message: impl Into<String>) -> Self {
        Self::SinkUnresponsive {
            message: message.into(),
        }
    }

    /**
        Create a persistence error with the given message.
    */
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /**
        Returns true if this error is fatal at export start, i.e. it must
        abort the job before any frames are written.
    */
    pub fn aborts_export(&self) -> bool {
        matches!(
            self,
            Self::SinkCreation { .. } | Self::UnsupportedOutputSettings { .. }
        )
    }
}

/**
    Result type alias for the frame pipeline.
*/
pub type Result<T> = std::result::Result<T, Error>;
