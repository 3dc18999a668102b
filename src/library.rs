/*!
    Persistence of finished exports.

    The export writer hands the finalized file to a `MediaLibrary` and then
    deletes the temporary output regardless of whether the library accepted
    it.
*/

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::sink::ContainerFormat;

/**
    Accepts a finished export file.

    Implementations copy or import the file; the caller retains ownership
    of the original path and is responsible for deleting it afterward.
*/
pub trait MediaLibrary: Send + Sync {
    fn save(&self, path: &Path) -> Result<()>;
}

/**
    A media library backed by a plain directory.
*/
pub struct FolderLibrary {
    root: PathBuf,
}

impl FolderLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /**
        The user's videos directory, falling back to the home directory.
    */
    pub fn in_default_location() -> Result<Self> {
        let root = dirs::video_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::persistence("no videos or home directory available"))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaLibrary for FolderLibrary {
    fn save(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::persistence(format!("not a file: {}", path.display())))?;
        fs::create_dir_all(&self.root)
            .map_err(|e| Error::persistence(format!("{}: {e}", self.root.display())))?;
        let destination = self.root.join(name);
        fs::copy(path, &destination)
            .map_err(|e| Error::persistence(format!("{}: {e}", destination.display())))?;
        Ok(())
    }
}

/**
    Deterministic timestamp-based output file name,
    `Output_<yyyyMMdd_HHmmss>.<ext>` with the extension taken from the
    sink's container format.
*/
pub fn timestamped_output_name(format: ContainerFormat, at: DateTime<Local>) -> String {
    format!(
        "Output_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/**
    Default directory for temporary export output: the user's documents
    directory, falling back to the system temp directory.
*/
pub fn default_export_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(std::env::temp_dir)
}
