//! Error types for Trellis operations.
//!
//! This module provides the main error type [`TrellisError`] which wraps
//! the error conditions of loading, saving and editing documents.

use std::io;

use thiserror::Error;

use trellis_core::GraphError;
use trellis_format::FormatError;

use crate::history::HistoryError;

/// The main error type for Trellis operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Configuration error: {0}")]
    Config(String),
}
