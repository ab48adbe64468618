//! Entities: the box-shaped nodes of a diagram.

use crate::{
    color::{DEFAULT_FILL_COLOR, DEFAULT_LINE_COLOR},
    geometry::{Dimension, Point},
};

/// Outline drawn for an entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityShape {
    /// No outline; only the text is drawn.
    NoShape,
    #[default]
    Rectangle,
    Ellipse,
    /// Stick figure.
    Actor,
    /// Top-level window with a title bar.
    Window,
    /// Regular polygon. Parameters: vertex count, rotation in degrees.
    Polygon,
    /// Box drawn in oblique projection. Parameters: depth dx, depth dy.
    Cuboid,
    /// Parameters: height of the elliptical caps.
    Cylinder,
}

impl EntityShape {
    /// Every shape, in declaration order.
    pub const ALL: [EntityShape; 8] = [
        EntityShape::NoShape,
        EntityShape::Rectangle,
        EntityShape::Ellipse,
        EntityShape::Actor,
        EntityShape::Window,
        EntityShape::Polygon,
        EntityShape::Cuboid,
        EntityShape::Cylinder,
    ];

    /// Shape parameters a freshly created entity of this shape gets.
    pub fn default_params(self) -> &'static [i32] {
        match self {
            EntityShape::Polygon => &[6, 0],
            EntityShape::Cuboid => &[10, 10],
            EntityShape::Cylinder => &[10],
            EntityShape::NoShape
            | EntityShape::Rectangle
            | EntityShape::Ellipse
            | EntityShape::Actor
            | EntityShape::Window => &[],
        }
    }
}

/// A yes/no display option of an entity's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeFlag {
    HasMaximize,
    HasMinimize,
    HasClose,
    /// Window operations menu in the title bar.
    HasWindowOps,
    Checked,
    TriState,
}

impl ShapeFlag {
    /// Every flag, in declaration order.
    pub const ALL: [ShapeFlag; 6] = [
        ShapeFlag::HasMaximize,
        ShapeFlag::HasMinimize,
        ShapeFlag::HasClose,
        ShapeFlag::HasWindowOps,
        ShapeFlag::Checked,
        ShapeFlag::TriState,
    ];

    /// Whether a freshly created entity of an applicable shape has the flag
    /// set.
    pub fn is_default(self) -> bool {
        matches!(
            self,
            ShapeFlag::HasMaximize
                | ShapeFlag::HasMinimize
                | ShapeFlag::HasClose
                | ShapeFlag::HasWindowOps
        )
    }

    /// Whether the flag affects how `shape` is drawn.
    ///
    /// `Checked` and `TriState` belong to check-box shapes, which no
    /// [`EntityShape`] draws; they are still kept when read from a file.
    pub fn applies_to(self, shape: EntityShape) -> bool {
        match self {
            ShapeFlag::HasMaximize
            | ShapeFlag::HasMinimize
            | ShapeFlag::HasClose
            | ShapeFlag::HasWindowOps => shape == EntityShape::Window,
            ShapeFlag::Checked | ShapeFlag::TriState => false,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of [`ShapeFlag`]s.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeFlags(u8);

impl ShapeFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The flags a freshly created entity of `shape` gets.
    pub fn defaults_for(shape: EntityShape) -> Self {
        ShapeFlag::ALL
            .into_iter()
            .filter(|flag| flag.is_default() && flag.applies_to(shape))
            .collect()
    }

    pub fn contains(self, flag: ShapeFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Adds `flag`; returns `true` if it was not already set.
    pub fn insert(&mut self, flag: ShapeFlag) -> bool {
        let added = !self.contains(flag);
        self.0 |= flag.bit();
        added
    }

    /// Clears `flag`; returns `true` if it was set.
    pub fn remove(&mut self, flag: ShapeFlag) -> bool {
        let removed = self.contains(flag);
        self.0 &= !flag.bit();
        removed
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the set flags in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ShapeFlag> {
        ShapeFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<ShapeFlag> for ShapeFlags {
    fn from_iter<T: IntoIterator<Item = ShapeFlag>>(iter: T) -> Self {
        let mut flags = Self::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

/// Horizontal placement of entity text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HTextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical placement of entity text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VTextAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// A box-shaped diagram node with a name and free-form attribute text.
///
/// Colors are names resolved through the owning diagram's
/// [`NamedColors`](crate::color::NamedColors) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Upper-left corner.
    pub loc: Point,
    pub size: Dimension,
    pub shape: EntityShape,
    pub fill_color: String,
    pub line_color: String,
    pub text_color: String,
    pub name: String,
    /// Attribute lines, separated by `'\n'`.
    pub attributes: String,
    pub h_text_align: HTextAlign,
    pub v_text_align: VTextAlign,
    /// Shape-specific parameters; see [`EntityShape::default_params`].
    pub shape_params: Vec<i32>,
    /// Display options; see [`ShapeFlags::defaults_for`].
    pub shape_flags: ShapeFlags,
}

impl Entity {
    /// Creates a default entity at `loc` with the given size.
    pub fn new(loc: Point, size: Dimension) -> Self {
        Self {
            loc,
            size,
            ..Self::default()
        }
    }

    /// Sets the name and returns the entity.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the attribute text and returns the entity.
    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = attributes.into();
        self
    }

    /// Sets the shape (resetting its parameters) and returns the entity.
    pub fn with_shape(mut self, shape: EntityShape) -> Self {
        self.set_shape(shape);
        self
    }

    /// Changes the shape and resets the shape parameters and flags to that
    /// shape's defaults.
    pub fn set_shape(&mut self, shape: EntityShape) {
        self.shape = shape;
        self.shape_params = shape.default_params().to_vec();
        self.shape_flags = ShapeFlags::defaults_for(shape);
    }

    /// Returns `true` if the shape parameters are the shape's defaults.
    pub fn has_default_params(&self) -> bool {
        self.shape_params == self.shape.default_params()
    }

    /// Returns `true` if the shape flags are the shape's defaults.
    pub fn has_default_flags(&self) -> bool {
        self.shape_flags == ShapeFlags::defaults_for(self.shape)
    }

    /// Center of the entity's bounding box, saturating at the `i32` range.
    pub fn center(&self) -> Point {
        Point::new(
            self.loc.x().saturating_add(self.size.width() / 2),
            self.loc.y().saturating_add(self.size.height() / 2),
        )
    }

    /// Iterates over the attribute lines.
    pub fn attribute_lines(&self) -> impl Iterator<Item = &str> {
        self.attributes.split('\n').filter(|line| !line.is_empty())
    }
}

impl Default for Entity {
    fn default() -> Self {
        let shape = EntityShape::default();
        Self {
            loc: Point::new(0, 0),
            size: Dimension::new(100, 50),
            shape,
            fill_color: DEFAULT_FILL_COLOR.to_string(),
            line_color: DEFAULT_LINE_COLOR.to_string(),
            text_color: DEFAULT_LINE_COLOR.to_string(),
            name: String::new(),
            attributes: String::new(),
            h_text_align: HTextAlign::default(),
            v_text_align: VTextAlign::default(),
            shape_params: shape.default_params().to_vec(),
            shape_flags: ShapeFlags::defaults_for(shape),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entity() {
        let e = Entity::default();
        assert_eq!(e.size, Dimension::new(100, 50));
        assert_eq!(e.shape, EntityShape::Rectangle);
        assert_eq!(e.fill_color, "Gray");
        assert!(e.has_default_params());
    }

    #[test]
    fn test_set_shape_resets_params() {
        let mut e = Entity::default().with_shape(EntityShape::Polygon);
        assert_eq!(e.shape_params, vec![6, 0]);

        e.shape_params = vec![5, 45];
        assert!(!e.has_default_params());

        e.set_shape(EntityShape::Cuboid);
        assert_eq!(e.shape_params, vec![10, 10]);
    }

    #[test]
    fn test_center() {
        let e = Entity::new(Point::new(10, 20), Dimension::new(30, 41));
        assert_eq!(e.center(), Point::new(25, 40));
    }

    #[test]
    fn test_center_saturates() {
        let e = Entity::new(Point::new(i32::MAX - 1, i32::MIN), Dimension::new(100, -100));
        assert_eq!(e.center(), Point::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_window_flags_follow_shape() {
        let mut e = Entity::default();
        assert!(e.shape_flags.is_empty());

        e.set_shape(EntityShape::Window);
        let flags: Vec<_> = e.shape_flags.iter().collect();
        assert_eq!(
            flags,
            vec![
                ShapeFlag::HasMaximize,
                ShapeFlag::HasMinimize,
                ShapeFlag::HasClose,
                ShapeFlag::HasWindowOps
            ]
        );
        assert!(e.has_default_flags());

        assert!(e.shape_flags.remove(ShapeFlag::HasMaximize));
        assert!(!e.shape_flags.remove(ShapeFlag::HasMaximize));
        assert!(!e.has_default_flags());

        e.set_shape(EntityShape::Ellipse);
        assert!(e.shape_flags.is_empty());
    }

    #[test]
    fn test_flag_set_ops() {
        let mut flags = ShapeFlags::empty();
        assert!(flags.insert(ShapeFlag::TriState));
        assert!(!flags.insert(ShapeFlag::TriState));
        assert!(flags.insert(ShapeFlag::Checked));
        assert_eq!(
            flags.iter().collect::<Vec<_>>(),
            vec![ShapeFlag::Checked, ShapeFlag::TriState]
        );
        assert!(ShapeFlags::defaults_for(EntityShape::Polygon).is_empty());
    }

    #[test]
    fn test_attribute_lines() {
        let e = Entity::default().with_attributes("a\n\nb");
        assert_eq!(e.attribute_lines().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
