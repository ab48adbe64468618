//! Named colors for Trellis diagrams
//!
//! Elements refer to colors by name. Each diagram carries its own ordered
//! [`NamedColors`] table mapping those names to [`Rgb`] values, so a
//! document can redefine "Gray" without touching any element.

use std::fmt;

use indexmap::IndexMap;

/// Name of the color used for an entity fill when nothing else is chosen.
pub const DEFAULT_FILL_COLOR: &str = "Gray";

/// Name of the color used for lines and text when nothing else is chosen.
pub const DEFAULT_LINE_COLOR: &str = "Black";

/// Name of the default diagram background color.
pub const DEFAULT_BACKGROUND_COLOR: &str = "White";

/// The built-in palette, in table order.
const DEFAULT_PALETTE: [(&str, Rgb); 11] = [
    ("White", Rgb::new(255, 255, 255)),
    ("Black", Rgb::new(0, 0, 0)),
    ("Gray", Rgb::new(192, 192, 192)),
    ("Light Gray", Rgb::new(224, 224, 224)),
    ("Dark Gray", Rgb::new(128, 128, 128)),
    ("Red", Rgb::new(255, 128, 128)),
    ("Orange", Rgb::new(255, 192, 128)),
    ("Yellow", Rgb::new(255, 255, 128)),
    ("Green", Rgb::new(128, 255, 128)),
    ("Blue", Rgb::new(128, 192, 255)),
    ("Purple", Rgb::new(224, 160, 255)),
];

/// An opaque 8-bit-per-channel color.
///
/// Displays in the document notation `RGB(r,g,b)`:
///
/// ```
/// use trellis_core::color::Rgb;
///
/// assert_eq!(Rgb::new(255, 0, 10).to_string(), "RGB(255,0,10)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    red: u8,
    green: u8,
    blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(self) -> u8 {
        self.red
    }

    pub fn green(self) -> u8 {
        self.green
    }

    pub fn blue(self) -> u8 {
        self.blue
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({},{},{})", self.red, self.green, self.blue)
    }
}

/// Ordered table of uniquely named colors.
///
/// Order is preserved for display and serialization. Inserting a name
/// that already exists replaces its value without moving it.
///
/// # Examples
///
/// ```
/// use trellis_core::color::{NamedColors, Rgb};
///
/// let mut colors = NamedColors::default();
/// assert_eq!(colors.len(), 11);
/// assert_eq!(colors.get("Gray"), Some(Rgb::new(192, 192, 192)));
///
/// colors.insert("Gray", Rgb::new(100, 100, 100));
/// assert_eq!(colors.len(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedColors {
    colors: IndexMap<String, Rgb>,
}

impl NamedColors {
    /// Creates a table with no entries.
    pub fn empty() -> Self {
        Self {
            colors: IndexMap::new(),
        }
    }

    /// Returns `true` if this table is exactly the built-in palette.
    pub fn is_default(&self) -> bool {
        self.colors.len() == DEFAULT_PALETTE.len()
            && self
                .colors
                .iter()
                .zip(DEFAULT_PALETTE.iter())
                .all(|((name, rgb), (default_name, default_rgb))| {
                    name == default_name && rgb == default_rgb
                })
    }

    /// Inserts or replaces a color, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, rgb: Rgb) -> Option<Rgb> {
        self.colors.insert(name.into(), rgb)
    }

    /// Returns the color with the given name.
    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.colors.get(name).copied()
    }

    /// Returns `true` if a color with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.colors.contains_key(name)
    }

    /// Removes a color, keeping the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Option<Rgb> {
        self.colors.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Iterates over `(name, color)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.colors.iter().map(|(name, rgb)| (name.as_str(), *rgb))
    }
}

impl Default for NamedColors {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|(name, rgb)| ((*name).to_string(), *rgb))
                .collect(),
        }
    }
}
