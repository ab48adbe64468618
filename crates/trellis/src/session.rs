//! Editing sessions: a working diagram together with its undo history.

use std::path::Path;

use log::{debug, info};

use trellis_core::{
    copy::{Selection, copy_filtered, cut_selection, paste_into},
    diagram::Diagram,
};

use crate::{
    TrellisError,
    config::AppConfig,
    history::{FixedLimit, History},
};

/// Label of the first history entry of every session.
const INITIAL_LABEL: &str = "Open";

/// A diagram being edited.
///
/// Every change goes through [`Session::edit`] (or one of the clipboard
/// helpers built on it), which checks the diagram's integrity and records
/// a history entry.
///
/// # Examples
///
/// ```
/// use trellis::{Session, config::AppConfig};
/// use trellis_core::entity::Entity;
///
/// let mut session = Session::blank(&AppConfig::default());
/// session.edit("Add entity", |d| d.add_entity(Entity::default()));
/// assert_eq!(session.diagram().entity_count(), 1);
///
/// session.undo().unwrap();
/// assert!(session.diagram().is_empty());
/// ```
#[derive(Debug)]
pub struct Session {
    diagram: Diagram,
    history: History<FixedLimit>,
    /// Snapshot as of the last open or save.
    clean: Diagram,
}

impl Session {
    /// Starts a session on `diagram`.
    pub fn new(diagram: Diagram, config: &AppConfig) -> Self {
        let history = History::new(
            &diagram,
            INITIAL_LABEL,
            FixedLimit(config.history().limit()),
        );
        let clean = diagram.deep_copy();
        Self {
            diagram,
            history,
            clean,
        }
    }

    /// Starts a session on a new, empty diagram sized per `config`.
    pub fn blank(config: &AppConfig) -> Self {
        let mut diagram = Diagram::new();
        diagram.set_window_size(config.document().window_size());
        Self::new(diagram, config)
    }

    /// Loads a file in either format and starts a session on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>, config: &AppConfig) -> Result<Self, TrellisError> {
        let diagram = crate::load(path)?;
        Ok(Self::new(diagram, config))
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn history(&self) -> &History<FixedLimit> {
        &self.history
    }

    /// Applies one command to the diagram and records it.
    ///
    /// # Panics
    ///
    /// Panics if the command leaves a dangling reference behind.
    pub fn edit<R>(&mut self, label: &str, command: impl FnOnce(&mut Diagram) -> R) -> R {
        let result = command(&mut self.diagram);
        self.diagram.assert_valid();
        self.history.record(&self.diagram, label);
        debug!(label = label; "Applied edit");
        result
    }

    /// Reverts the most recent command.
    ///
    /// # Errors
    ///
    /// Fails if there is nothing to undo.
    pub fn undo(&mut self) -> Result<(), TrellisError> {
        let snapshot = self.history.undo()?;
        self.restore(snapshot);
        Ok(())
    }

    /// Re-applies future `which` of the current history entry.
    ///
    /// # Errors
    ///
    /// Fails if `which` does not name a future.
    pub fn redo(&mut self, which: usize) -> Result<(), TrellisError> {
        let snapshot = self.history.redo(which)?;
        self.restore(snapshot);
        Ok(())
    }

    /// Re-applies the most recently resumed future.
    ///
    /// # Errors
    ///
    /// Fails if there is nothing to redo.
    pub fn redo_most_recent(&mut self) -> Result<(), TrellisError> {
        let snapshot = self.history.redo_most_recent()?;
        self.restore(snapshot);
        Ok(())
    }

    /// Replaces the working diagram with a history snapshot, rekeyed so
    /// that no key handed out earlier in the session resolves in it.
    fn restore(&mut self, snapshot: Diagram) {
        self.diagram = snapshot.deep_copy_after(&self.diagram);
    }

    /// Copies the selected elements into a clipboard diagram.
    pub fn copy_selection(&self, selection: &Selection) -> Diagram {
        copy_filtered(&self.diagram, selection)
    }

    /// Copies the selected elements into a clipboard diagram and removes
    /// them from the session's diagram.
    pub fn cut_selection(&mut self, selection: &Selection) -> Diagram {
        self.edit("Cut", |d| cut_selection(d, selection))
    }

    /// Appends a copy of `clipboard` and returns the pasted elements.
    pub fn paste(&mut self, clipboard: &Diagram) -> Selection {
        self.edit("Paste", |d| paste_into(d, clipboard))
    }

    /// Writes the diagram in the current format.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), TrellisError> {
        crate::save(&self.diagram, path)?;
        self.clean = self.diagram.deep_copy();
        info!("Session saved");
        Ok(())
    }

    /// `true` if the diagram differs from what was last opened or saved.
    pub fn is_dirty(&self) -> bool {
        self.diagram != self.clean
    }
}
