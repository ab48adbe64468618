//! Trellis - document model, file formats and editing history for class
//! diagrams.
//!
//! This crate ties the workspace together: it loads and saves documents in
//! either file format, keeps a branching undo history, and bundles both
//! into an editing [`Session`].

pub mod config;
pub mod history;

mod error;
mod session;

pub use trellis_core::{color, copy, diagram, entity, geometry, identifier, inheritance, relation};

pub use error::TrellisError;
pub use session::Session;

use std::{fs, path::Path};

use log::{debug, info};

use trellis_core::diagram::Diagram;

/// Reads a document in either file format.
///
/// # Errors
///
/// Returns [`TrellisError::Io`] if the file cannot be read and
/// [`TrellisError::Format`] if its contents cannot be decoded.
///
/// # Examples
///
/// ```rust,no_run
/// let diagram = trellis::load("classes.ded").expect("Failed to load");
/// println!("{} entities", diagram.entity_count());
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<Diagram, TrellisError> {
    let path = path.as_ref();
    info!(path:? = path; "Loading diagram");

    let bytes = fs::read(path)?;
    let diagram = trellis_format::decode_bytes(&bytes)?;

    debug!(
        entities = diagram.entity_count(),
        inheritances = diagram.inheritance_count(),
        relations = diagram.relation_count();
        "Diagram loaded"
    );
    Ok(diagram)
}

/// Writes a document in the current file format.
///
/// # Errors
///
/// Returns [`TrellisError::Io`] if the file cannot be written.
pub fn save(diagram: &Diagram, path: impl AsRef<Path>) -> Result<(), TrellisError> {
    let path = path.as_ref();
    info!(path:? = path; "Saving diagram");

    let text = trellis_format::encode(diagram);
    fs::write(path, text)?;
    Ok(())
}
