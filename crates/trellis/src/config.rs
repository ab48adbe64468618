//! Configuration types for Trellis editing sessions.
//!
//! All types implement [`serde::Deserialize`] and default every field, so
//! an empty configuration file is valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level application configuration.
//! - [`HistoryConfig`] - Bounds the undo history.
//! - [`DocumentConfig`] - Properties of newly created documents.
//!
//! # Example
//!
//! ```
//! # use trellis::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.history().limit(), 100);
//! assert_eq!(config.document().window_size().width(), 700);
//! ```

use serde::Deserialize;

use trellis_core::{diagram::DEFAULT_WINDOW_SIZE, geometry::Dimension};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Undo history section.
    #[serde(default)]
    history: HistoryConfig,

    /// New-document section.
    #[serde(default)]
    document: DocumentConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(history: HistoryConfig, document: DocumentConfig) -> Self {
        Self { history, document }
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }

    /// Returns the new-document configuration.
    pub fn document(&self) -> &DocumentConfig {
        &self.document
    }
}

fn default_history_limit() -> usize {
    100
}

/// Undo history configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum entries kept on the undo chain; 0 keeps everything.
    #[serde(default = "default_history_limit")]
    limit: usize,
}

impl HistoryConfig {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Returns the history limit; 0 means unlimited.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

fn default_window_width() -> i32 {
    DEFAULT_WINDOW_SIZE.width()
}

fn default_window_height() -> i32 {
    DEFAULT_WINDOW_SIZE.height()
}

/// Properties applied to newly created documents.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_window_width")]
    window_width: i32,

    #[serde(default = "default_window_height")]
    window_height: i32,
}

impl DocumentConfig {
    pub fn new(window_size: Dimension) -> Self {
        Self {
            window_width: window_size.width(),
            window_height: window_size.height(),
        }
    }

    /// Returns the window size for new documents.
    pub fn window_size(&self) -> Dimension {
        Dimension::new(self.window_width, self.window_height)
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
