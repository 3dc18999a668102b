/*!
    Pipeline observers.

    The pipeline publishes to non-owning registered listeners with an
    explicit register/unregister lifecycle — the only way downstream UI
    learns of playback and export progress.
*/

use image::RgbaImage;

use crate::writer::ExportOutcome;

/**
    Receives playback output: one rendered frame and one position update
    per successful tick.
*/
pub trait PlaybackObserver {
    fn frame_rendered(&self, image: &RgbaImage);
    fn position_changed(&self, normalized: f64);
}

/**
    Receives export progress and completion.
*/
pub trait ExportObserver {
    fn export_progress(&self, fraction: f64);
    fn export_complete(&self, outcome: &ExportOutcome);
}

/**
    Handle identifying a registered observer.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/**
    An ordered registry of observers.
*/
pub struct Observers<T: ?Sized> {
    entries: Vec<(ObserverId, Box<T>)>,
    next_id: u64,
}

impl<T: ?Sized> Observers<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /**
        Register an observer, returning the id to unregister it with.
    */
    pub fn register(&mut self, observer: Box<T>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /**
        Remove a previously registered observer. Returns false if the id is
        unknown (e.g. already unregistered).
    */
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, observer)| observer.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}
