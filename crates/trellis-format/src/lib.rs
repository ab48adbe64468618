//! Trellis Document Formats
//!
//! Encoding and decoding of Trellis diagrams. Two formats exist:
//!
//! - **JSON** ([`json`] module): the current format, read and written.
//!   Every older JSON version is still readable.
//! - **Legacy binary** ([`legacy`] module): the original stream format,
//!   decode only.
//!
//! [`decode_bytes`] tells the two apart by the legacy magic number.
//!
//! # Example
//!
//! ```
//! use trellis_core::{diagram::Diagram, entity::Entity};
//!
//! let mut diagram = Diagram::new();
//! diagram.add_entity(Entity::default().with_name("Order"));
//!
//! let text = trellis_format::encode(&diagram);
//! let decoded = trellis_format::decode_bytes(text.as_bytes()).unwrap();
//! assert_eq!(decoded, diagram);
//! ```

mod color_literal;
mod error;
pub mod json;
pub mod legacy;
mod names;

use log::trace;
use trellis_core::diagram::Diagram;

pub use color_literal::parse_color_literal;
pub use error::{FormatError, FormatErrorKind, Result};
pub use json::{CURRENT_VERSION, decode, encode};
pub use legacy::decode_legacy;

/// Decodes a document in either format.
///
/// Input starting with the legacy magic number is read as a legacy stream;
/// anything else must be UTF-8 JSON.
///
/// # Errors
///
/// Returns the decoder's [`FormatError`], or an
/// [`InvalidJson`](FormatErrorKind::InvalidJson) error for input that is
/// neither legacy nor UTF-8.
pub fn decode_bytes(bytes: &[u8]) -> Result<Diagram> {
    if legacy::is_legacy(bytes) {
        trace!(len = bytes.len(); "Detected legacy format");
        return decode_legacy(bytes);
    }
    let text = std::str::from_utf8(bytes).map_err(|err| {
        FormatError::new(
            FormatErrorKind::InvalidJson,
            format!("document is not UTF-8: {err}"),
        )
    })?;
    trace!(len = bytes.len(); "Detected JSON format");
    decode(text)
}
