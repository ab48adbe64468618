//! Inheritance nodes.

use crate::{geometry::Point, identifier::EntityId};

/// Node marking a generalization relationship.
///
/// It points directly at its parent entity; the specializations are then
/// attached to the node through ordinary relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inheritance {
    /// The generalized entity. Must be live in the same diagram.
    pub parent: EntityId,
    /// `true` if the parent can exist without being any of the children.
    pub open: bool,
    pub pt: Point,
}

impl Inheritance {
    pub fn new(parent: EntityId, open: bool, pt: Point) -> Self {
        Self { parent, open, pt }
    }
}
