//! Error adapter for converting TrellisError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use trellis::TrellisError;
use trellis_format::FormatErrorKind;

/// Adapter implementing [`MietteDiagnostic`] for [`TrellisError`].
///
/// Decode failures carry their [`FormatErrorKind`] in the diagnostic code,
/// e.g. `trellis::format::bad_magic`.
pub struct ErrorAdapter<'a>(pub &'a TrellisError);

impl ErrorAdapter<'_> {
    /// Stable diagnostic code for the wrapped error.
    pub fn code_name(&self) -> String {
        match self.0 {
            TrellisError::Io(_) => "trellis::io".to_string(),
            TrellisError::Format(err) => format!("trellis::format::{}", err.kind().code()),
            TrellisError::Graph(_) => "trellis::graph".to_string(),
            TrellisError::History(_) => "trellis::history".to_string(),
            TrellisError::Config(_) => "trellis::config".to_string(),
        }
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_name()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let TrellisError::Format(err) = self.0 else {
            return None;
        };
        let help = match err.kind() {
            FormatErrorKind::BadMagic | FormatErrorKind::InvalidJson => {
                "the file is neither a Trellis document nor a legacy binary diagram"
            }
            FormatErrorKind::UnsupportedVersion => {
                "the file was written by a newer release of Trellis"
            }
            FormatErrorKind::Desynchronized | FormatErrorKind::UnexpectedEof => {
                "the legacy file appears to be truncated or corrupted"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
