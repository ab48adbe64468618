//! Relations (connectors) and their endpoints.

use crate::{
    color::DEFAULT_LINE_COLOR,
    diagram::Diagram,
    geometry::Point,
    identifier::{EntityId, InheritanceId},
};

/// Arrowhead drawn at a relation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowStyle {
    None,
    /// Solid equilateral triangle.
    FilledTriangle,
    /// Like `--->>`.
    DoubleAngle,
}

/// Which end of a relation an endpoint sits on.
///
/// The two ends have different default arrowheads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    Start,
    End,
}

impl EndpointRole {
    /// Arrowhead used when none has been chosen for this end.
    pub fn default_arrow_style(self) -> ArrowStyle {
        match self {
            EndpointRole::Start => ArrowStyle::None,
            EndpointRole::End => ArrowStyle::FilledTriangle,
        }
    }
}

/// What a relation endpoint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointTarget {
    Entity(EntityId),
    Inheritance(InheritanceId),
    /// A free point in diagram space.
    Point(Point),
}

/// One end of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationEndpoint {
    pub target: EndpointTarget,
    pub arrow_style: ArrowStyle,
}

impl RelationEndpoint {
    pub fn new(target: EndpointTarget, arrow_style: ArrowStyle) -> Self {
        Self {
            target,
            arrow_style,
        }
    }

    /// Endpoint attached to an entity, with the role's default arrowhead.
    pub fn entity(id: EntityId, role: EndpointRole) -> Self {
        Self::new(EndpointTarget::Entity(id), role.default_arrow_style())
    }

    /// Endpoint attached to an inheritance node, with the role's default arrowhead.
    pub fn inheritance(id: InheritanceId, role: EndpointRole) -> Self {
        Self::new(EndpointTarget::Inheritance(id), role.default_arrow_style())
    }

    /// Endpoint at a free point, with the role's default arrowhead.
    pub fn point(pt: Point, role: EndpointRole) -> Self {
        Self::new(EndpointTarget::Point(pt), role.default_arrow_style())
    }

    /// Returns `true` if this endpoint is attached to exactly `id`.
    pub fn is_entity(&self, id: EntityId) -> bool {
        self.target == EndpointTarget::Entity(id)
    }

    /// The point a connector attached here should aim at, or `None` if the
    /// endpoint dangles in `diagram`.
    pub fn center(&self, diagram: &Diagram) -> Option<Point> {
        diagram.endpoint_center(self)
    }

    /// Returns `true` if this endpoint is attached to exactly `id`.
    pub fn is_inheritance(&self, id: InheritanceId) -> bool {
        self.target == EndpointTarget::Inheritance(id)
    }
}

/// Routing used when a relation is drawn.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingAlgorithm {
    /// Straight segments through the control points.
    Direct,
    /// Horizontal and vertical segments only, starting horizontally.
    #[default]
    ManhattanHoriz,
    /// Horizontal and vertical segments only, starting vertically.
    ManhattanVert,
}

impl RoutingAlgorithm {
    pub fn is_manhattan(self) -> bool {
        matches!(
            self,
            RoutingAlgorithm::ManhattanHoriz | RoutingAlgorithm::ManhattanVert
        )
    }
}

/// Common dash patterns offered by editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashStyle {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl DashStyle {
    /// Dash lengths for this style; empty means solid.
    pub fn pattern(self) -> &'static [u32] {
        match self {
            DashStyle::Solid => &[],
            DashStyle::Dashed => &[5, 2],
            DashStyle::Dotted => &[1, 2],
            DashStyle::DashDot => &[5, 2, 1, 2],
        }
    }
}

/// Returns `true` if `pattern` is a usable dash pattern: empty (solid) or
/// containing at least one positive length.
pub fn is_valid_dash_pattern(pattern: &[u32]) -> bool {
    pattern.is_empty() || pattern.iter().any(|&len| len > 0)
}

/// A connector between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub start: RelationEndpoint,
    pub end: RelationEndpoint,
    /// Intermediate points, in drawing order.
    pub control_pts: Vec<Point>,
    pub routing: RoutingAlgorithm,
    pub label: String,
    /// Line width in pixels; `None` uses the renderer's default.
    pub line_width: Option<u32>,
    pub line_color: String,
    pub text_color: String,
    /// Alternating dash/gap lengths; empty draws a solid line.
    pub dash_structure: Vec<u32>,
}

impl Relation {
    /// Creates a relation with default styling between two endpoints.
    pub fn new(start: RelationEndpoint, end: RelationEndpoint) -> Self {
        Self {
            start,
            end,
            control_pts: Vec::new(),
            routing: RoutingAlgorithm::default(),
            label: String::new(),
            line_width: None,
            line_color: DEFAULT_LINE_COLOR.to_string(),
            text_color: DEFAULT_LINE_COLOR.to_string(),
            dash_structure: Vec::new(),
        }
    }

    /// Creates a relation between two entities.
    pub fn between_entities(start: EntityId, end: EntityId) -> Self {
        Self::new(
            RelationEndpoint::entity(start, EndpointRole::Start),
            RelationEndpoint::entity(end, EndpointRole::End),
        )
    }

    /// Returns the endpoint for `role`.
    pub fn endpoint(&self, role: EndpointRole) -> &RelationEndpoint {
        match role {
            EndpointRole::Start => &self.start,
            EndpointRole::End => &self.end,
        }
    }

    /// `true` if either endpoint is attached to exactly `id`.
    pub fn involves_entity(&self, id: EntityId) -> bool {
        self.start.is_entity(id) || self.end.is_entity(id)
    }

    /// `true` if either endpoint is attached to exactly `id`.
    pub fn involves_inheritance(&self, id: InheritanceId) -> bool {
        self.start.is_inheritance(id) || self.end.is_inheritance(id)
    }

    /// Replaces the dash pattern with one of the preset styles.
    pub fn set_dash_style(&mut self, style: DashStyle) {
        self.dash_structure = style.pattern().to_vec();
    }
}
