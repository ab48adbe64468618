//! Parser for `RGB(r,g,b)` color literals.
//!
//! Named-color tables store their values as text of the form
//! `RGB(255,128,0)`. Components are decimal integers in `0..=255`; spaces
//! are tolerated around each component.

use trellis_core::color::Rgb;
use winnow::{
    Parser as _,
    ascii::{digit1, space0},
    combinator::{delimited, preceded},
    error::{ModalResult, StrContext},
};

use crate::error::{FormatError, Result};

fn component(input: &mut &str) -> ModalResult<u8> {
    delimited(space0, digit1.try_map(|digits: &str| digits.parse::<u8>()), space0)
        .context(StrContext::Label("color component"))
        .parse_next(input)
}

fn rgb(input: &mut &str) -> ModalResult<Rgb> {
    (
        preceded(("RGB", space0, '('), component),
        preceded(',', component),
        delimited(',', component, ')'),
    )
        .map(|(red, green, blue)| Rgb::new(red, green, blue))
        .parse_next(input)
}

/// Parses a complete color literal.
///
/// # Errors
///
/// Returns a [`Malformed`](crate::FormatErrorKind::Malformed) error if
/// `text` is not exactly one literal or a component is out of range.
pub fn parse_color_literal(text: &str) -> Result<Rgb> {
    rgb.parse(text.trim()).map_err(|_| {
        FormatError::malformed(format!(
            "invalid color \"{text}\"; expected RGB(r,g,b) with each component in 0..=255"
        ))
    })
}
