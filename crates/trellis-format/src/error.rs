//! Error types for document decoding.

use std::fmt;

use thiserror::Error;

/// Category of a decode failure.
///
/// The category is stable and machine readable; the accompanying message
/// is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatErrorKind {
    /// The legacy stream does not start with the expected magic number.
    BadMagic,
    /// The declared version is outside the supported range.
    UnsupportedVersion,
    /// The JSON `type` field is not a Trellis diagram.
    WrongType,
    /// A field is missing, has the wrong type or holds an invalid value.
    Malformed,
    /// An index reference does not name an earlier element.
    UnresolvedReference,
    /// The named-color table lists a name twice.
    DuplicateColor,
    /// A legacy section checkpoint did not match.
    Desynchronized,
    /// The legacy stream ended early.
    UnexpectedEof,
    /// The input is not well-formed JSON.
    InvalidJson,
}

impl FormatErrorKind {
    /// Short snake-case code, suitable for diagnostics.
    pub fn code(self) -> &'static str {
        match self {
            FormatErrorKind::BadMagic => "bad_magic",
            FormatErrorKind::UnsupportedVersion => "unsupported_version",
            FormatErrorKind::WrongType => "wrong_type",
            FormatErrorKind::Malformed => "malformed",
            FormatErrorKind::UnresolvedReference => "unresolved_reference",
            FormatErrorKind::DuplicateColor => "duplicate_color",
            FormatErrorKind::Desynchronized => "desynchronized",
            FormatErrorKind::UnexpectedEof => "unexpected_eof",
            FormatErrorKind::InvalidJson => "invalid_json",
        }
    }
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A recoverable failure to decode a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FormatError {
    kind: FormatErrorKind,
    message: String,
}

impl FormatError {
    pub fn new(kind: FormatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::Malformed, message)
    }

    pub(crate) fn unresolved(message: impl Into<String>) -> Self {
        Self::new(FormatErrorKind::UnresolvedReference, message)
    }

    pub fn kind(&self) -> FormatErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(FormatErrorKind::InvalidJson, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
