//! The diagram aggregate and its referential-integrity rules.
//!
//! A [`Diagram`] owns three ordered element lists:
//!
//! - entities, in z-order (the last entity is drawn on top),
//! - inheritance nodes, each anchored to a live parent entity,
//! - relations, whose endpoints are entities, inheritance nodes or free
//!   points.
//!
//! Every element lives in an arena keyed by the identifiers from
//! [`crate::identifier`]. Removal is cascade-aware: removing an entity
//! first removes every relation attached to it and every inheritance node
//! anchored to it, so no operation on this type can leave a dangling key
//! behind.
//!
//! # Example
//!
//! ```
//! use trellis_core::{
//!     diagram::Diagram,
//!     entity::Entity,
//!     geometry::{Dimension, Point},
//!     relation::Relation,
//! };
//!
//! let mut diagram = Diagram::new();
//! let a = diagram.add_entity(Entity::new(Point::new(5, 10), Dimension::new(30, 40)));
//! let b = diagram.add_entity(Entity::new(Point::new(15, 20), Dimension::new(130, 140)));
//! diagram.add_relation(Relation::between_entities(a, b)).unwrap();
//!
//! let removed = diagram.remove_entity(a).unwrap();
//! assert_eq!(removed.relations, 1);
//! assert_eq!(diagram.relation_count(), 0);
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    color::{DEFAULT_BACKGROUND_COLOR, NamedColors},
    entity::Entity,
    error::GraphError,
    geometry::{Dimension, Point},
    identifier::{EntityId, InheritanceId, KeyAllocator, RelationId},
    inheritance::Inheritance,
    relation::{EndpointTarget, Relation, RelationEndpoint, is_valid_dash_pattern},
};

/// Window size of a freshly created diagram.
pub const DEFAULT_WINDOW_SIZE: Dimension = Dimension::new(700, 500);

/// Result of a cascade-aware removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed<T> {
    /// The element that was asked to be removed.
    pub element: T,
    /// Number of relations removed along with it.
    pub relations: usize,
    /// Number of inheritance nodes removed along with it.
    pub inheritances: usize,
}

/// A complete diagram document.
///
/// Equality is structural: element lists are compared position by
/// position, and references are compared by the list position of what they
/// point at. Two diagrams can therefore be equal even though their arena
/// keys differ, which is always the case for a diagram and its copy.
#[derive(Debug)]
pub struct Diagram {
    window_size: Dimension,
    draw_file_name: bool,
    background_color: String,
    named_colors: NamedColors,
    entities: IndexMap<EntityId, Entity>,
    inheritances: IndexMap<InheritanceId, Inheritance>,
    relations: IndexMap<RelationId, Relation>,
    keys: KeyAllocator,
}

/// A reference with its arena key replaced by a list position.
#[derive(Debug, PartialEq, Eq)]
enum ResolvedTarget {
    Entity(usize),
    Inheritance(usize),
    Point(Point),
    Dangling,
}

impl Diagram {
    /// Creates an empty diagram with the default window size and palette.
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            draw_file_name: true,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            named_colors: NamedColors::default(),
            entities: IndexMap::new(),
            inheritances: IndexMap::new(),
            relations: IndexMap::new(),
            keys: KeyAllocator::default(),
        }
    }

    /// An empty diagram whose keys continue after every key `source` has
    /// ever issued, so keys held against `source` resolve to nothing here.
    pub(crate) fn empty_successor(source: &Diagram) -> Self {
        Self {
            keys: KeyAllocator::starting_at(source.keys.peek()),
            ..Self::new()
        }
    }

    /// Advances this diagram's keys past those of `other`.
    pub(crate) fn skip_keys_of(&mut self, other: &Diagram) {
        self.keys.skip_past(&other.keys);
    }

    // ------------------------------------------------------------------
    // Diagram-level properties
    // ------------------------------------------------------------------

    pub fn window_size(&self) -> Dimension {
        self.window_size
    }

    pub fn set_window_size(&mut self, size: Dimension) {
        self.window_size = size;
    }

    /// Whether editors should draw the file name in the diagram corner.
    pub fn draw_file_name(&self) -> bool {
        self.draw_file_name
    }

    pub fn set_draw_file_name(&mut self, draw: bool) {
        self.draw_file_name = draw;
    }

    /// Name of the background color in [`Self::named_colors`].
    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    pub fn set_background_color(&mut self, name: impl Into<String>) {
        self.background_color = name.into();
    }

    pub fn named_colors(&self) -> &NamedColors {
        &self.named_colors
    }

    pub fn named_colors_mut(&mut self) -> &mut NamedColors {
        &mut self.named_colors
    }

    pub fn set_named_colors(&mut self, colors: NamedColors) {
        self.named_colors = colors;
    }

    /// Returns `true` if the diagram has no elements at all.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.inheritances.is_empty() && self.relations.is_empty()
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Adds an entity on top of all others and returns its key.
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::from_raw(self.keys.allocate());
        trace!(id:% = id; "Adding entity");
        self.entities.insert(id, entity);
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterates over entities bottom to top.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Entity keys bottom to top.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Z-order position of an entity (0 is the bottom).
    pub fn entity_position(&self, id: EntityId) -> Option<usize> {
        self.entities.get_index_of(&id)
    }

    /// Entity at a z-order position.
    pub fn entity_at(&self, position: usize) -> Option<(EntityId, &Entity)> {
        self.entities
            .get_index(position)
            .map(|(id, entity)| (*id, entity))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Removes an entity together with every relation attached to it and
    /// every inheritance node anchored to it.
    ///
    /// Dependents are found by key, so a structurally equal but distinct
    /// entity keeps its relations.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownEntity`] if `id` is not in the diagram.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Removed<Entity>, GraphError> {
        if !self.entities.contains_key(&id) {
            return Err(GraphError::UnknownEntity(id));
        }

        let mut relations = self.remove_relations_where(|rel| rel.involves_entity(id));

        let anchored: Vec<InheritanceId> = self
            .inheritances
            .iter()
            .filter(|(_, inh)| inh.parent == id)
            .map(|(inh_id, _)| *inh_id)
            .collect();
        for inh_id in &anchored {
            let removed = self
                .remove_inheritance(*inh_id)
                .expect("anchored inheritance was just listed");
            relations += removed.relations;
        }

        let element = self
            .entities
            .shift_remove(&id)
            .expect("presence checked above");

        debug!(
            id:% = id,
            relations = relations,
            inheritances = anchored.len();
            "Removed entity"
        );

        Ok(Removed {
            element,
            relations,
            inheritances: anchored.len(),
        })
    }

    /// Moves `ids` above every other entity.
    ///
    /// Relative order is kept both within the moved set and within the
    /// rest. Keys not in the diagram are ignored.
    pub fn move_to_front(&mut self, ids: &[EntityId]) {
        let moved: HashSet<EntityId> = ids.iter().copied().collect();
        self.entities
            .sort_by(|a, _, b, _| moved.contains(a).cmp(&moved.contains(b)));
    }

    /// Moves `ids` below every other entity.
    ///
    /// Relative order is kept both within the moved set and within the
    /// rest. Keys not in the diagram are ignored.
    pub fn move_to_back(&mut self, ids: &[EntityId]) {
        let moved: HashSet<EntityId> = ids.iter().copied().collect();
        self.entities
            .sort_by(|a, _, b, _| moved.contains(b).cmp(&moved.contains(a)));
    }

    // ------------------------------------------------------------------
    // Inheritance nodes
    // ------------------------------------------------------------------

    /// Adds an inheritance node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingEntity`] if the parent is not a live
    /// entity of this diagram.
    pub fn add_inheritance(
        &mut self,
        inheritance: Inheritance,
    ) -> Result<InheritanceId, GraphError> {
        if !self.entities.contains_key(&inheritance.parent) {
            return Err(GraphError::DanglingEntity {
                id: inheritance.parent,
                context: "inheritance parent",
            });
        }
        let id = InheritanceId::from_raw(self.keys.allocate());
        trace!(id:% = id, parent:% = inheritance.parent; "Adding inheritance");
        self.inheritances.insert(id, inheritance);
        Ok(id)
    }

    pub fn inheritance(&self, id: InheritanceId) -> Option<&Inheritance> {
        self.inheritances.get(&id)
    }

    /// Mutable access to an inheritance node.
    ///
    /// Re-parenting through this reference is allowed; callers that do so
    /// should follow up with [`Self::self_check`].
    pub fn inheritance_mut(&mut self, id: InheritanceId) -> Option<&mut Inheritance> {
        self.inheritances.get_mut(&id)
    }

    pub fn contains_inheritance(&self, id: InheritanceId) -> bool {
        self.inheritances.contains_key(&id)
    }

    pub fn inheritances(&self) -> impl Iterator<Item = (InheritanceId, &Inheritance)> {
        self.inheritances.iter().map(|(id, inh)| (*id, inh))
    }

    pub fn inheritance_ids(&self) -> impl Iterator<Item = InheritanceId> + '_ {
        self.inheritances.keys().copied()
    }

    pub fn inheritance_position(&self, id: InheritanceId) -> Option<usize> {
        self.inheritances.get_index_of(&id)
    }

    pub fn inheritance_at(&self, position: usize) -> Option<(InheritanceId, &Inheritance)> {
        self.inheritances
            .get_index(position)
            .map(|(id, inh)| (*id, inh))
    }

    pub fn inheritance_count(&self) -> usize {
        self.inheritances.len()
    }

    /// Removes an inheritance node and every relation attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownInheritance`] if `id` is not in the
    /// diagram.
    pub fn remove_inheritance(
        &mut self,
        id: InheritanceId,
    ) -> Result<Removed<Inheritance>, GraphError> {
        if !self.inheritances.contains_key(&id) {
            return Err(GraphError::UnknownInheritance(id));
        }

        let relations = self.remove_relations_where(|rel| rel.involves_inheritance(id));
        let element = self
            .inheritances
            .shift_remove(&id)
            .expect("presence checked above");

        debug!(id:% = id, relations = relations; "Removed inheritance");

        Ok(Removed {
            element,
            relations,
            inheritances: 0,
        })
    }

    // ------------------------------------------------------------------
    // Relations
    // ------------------------------------------------------------------

    /// Adds a relation.
    ///
    /// # Errors
    ///
    /// Fails if an endpoint refers to an element that is not in this
    /// diagram, or if the dash pattern is malformed.
    pub fn add_relation(&mut self, relation: Relation) -> Result<RelationId, GraphError> {
        self.check_endpoint(&relation.start, "relation start")?;
        self.check_endpoint(&relation.end, "relation end")?;
        let id = RelationId::from_raw(self.keys.allocate());
        if !is_valid_dash_pattern(&relation.dash_structure) {
            return Err(GraphError::MalformedDashPattern {
                relation: id,
                pattern: relation.dash_structure,
            });
        }
        trace!(id:% = id; "Adding relation");
        self.relations.insert(id, relation);
        Ok(id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Mutable access to a relation.
    ///
    /// Callers that retarget endpoints should follow up with
    /// [`Self::self_check`].
    pub fn relation_mut(&mut self, id: RelationId) -> Option<&mut Relation> {
        self.relations.get_mut(&id)
    }

    pub fn contains_relation(&self, id: RelationId) -> bool {
        self.relations.contains_key(&id)
    }

    pub fn relations(&self) -> impl Iterator<Item = (RelationId, &Relation)> {
        self.relations.iter().map(|(id, rel)| (*id, rel))
    }

    pub fn relation_ids(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.keys().copied()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Removes a single relation.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownRelation`] if `id` is not in the diagram.
    pub fn remove_relation(&mut self, id: RelationId) -> Result<Relation, GraphError> {
        self.relations
            .shift_remove(&id)
            .ok_or(GraphError::UnknownRelation(id))
    }

    /// Relations with an endpoint on exactly `id`.
    pub fn relations_involving_entity(
        &self,
        id: EntityId,
    ) -> impl Iterator<Item = RelationId> + '_ {
        self.relations
            .iter()
            .filter(move |(_, rel)| rel.involves_entity(id))
            .map(|(rel_id, _)| *rel_id)
    }

    /// The point a connector attached to `endpoint` should aim at, or
    /// `None` if the endpoint dangles.
    pub fn endpoint_center(&self, endpoint: &RelationEndpoint) -> Option<Point> {
        match endpoint.target {
            EndpointTarget::Entity(id) => self.entity(id).map(Entity::center),
            EndpointTarget::Inheritance(id) => self.inheritance(id).map(|inh| inh.pt),
            EndpointTarget::Point(pt) => Some(pt),
        }
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Verifies that every reference resolves inside this diagram and every
    /// dash pattern is well formed.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn self_check(&self) -> Result<(), GraphError> {
        for (id, rel) in &self.relations {
            self.check_endpoint(&rel.start, "relation start")?;
            self.check_endpoint(&rel.end, "relation end")?;
            if !is_valid_dash_pattern(&rel.dash_structure) {
                return Err(GraphError::MalformedDashPattern {
                    relation: *id,
                    pattern: rel.dash_structure.clone(),
                });
            }
        }

        for inh in self.inheritances.values() {
            if !self.entities.contains_key(&inh.parent) {
                return Err(GraphError::DanglingEntity {
                    id: inh.parent,
                    context: "inheritance parent",
                });
            }
        }

        Ok(())
    }

    /// Runs [`Self::self_check`] on a diagram the program itself built.
    ///
    /// # Panics
    ///
    /// Panics on any violation; a dangling reference here is a bug, not bad
    /// input.
    pub fn assert_valid(&self) {
        if let Err(err) = self.self_check() {
            panic!("diagram integrity violated: {err}");
        }
    }

    fn check_endpoint(
        &self,
        endpoint: &RelationEndpoint,
        context: &'static str,
    ) -> Result<(), GraphError> {
        match endpoint.target {
            EndpointTarget::Entity(id) if !self.entities.contains_key(&id) => {
                Err(GraphError::DanglingEntity { id, context })
            }
            EndpointTarget::Inheritance(id) if !self.inheritances.contains_key(&id) => {
                Err(GraphError::DanglingInheritance { id, context })
            }
            _ => Ok(()),
        }
    }

    fn remove_relations_where(&mut self, mut pred: impl FnMut(&Relation) -> bool) -> usize {
        let before = self.relations.len();
        self.relations.retain(|_, rel| !pred(rel));
        before - self.relations.len()
    }

    fn resolve(&self, target: &EndpointTarget) -> ResolvedTarget {
        match *target {
            EndpointTarget::Entity(id) => self
                .entity_position(id)
                .map_or(ResolvedTarget::Dangling, ResolvedTarget::Entity),
            EndpointTarget::Inheritance(id) => self
                .inheritance_position(id)
                .map_or(ResolvedTarget::Dangling, ResolvedTarget::Inheritance),
            EndpointTarget::Point(pt) => ResolvedTarget::Point(pt),
        }
    }
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Diagram {
    /// Deep copy through the filtered copy engine with an always-true
    /// filter; the clone gets fresh arena keys that never collide with the
    /// original's.
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        if self.window_size != other.window_size
            || self.draw_file_name != other.draw_file_name
            || self.background_color != other.background_color
            || self.named_colors != other.named_colors
            || self.entities.len() != other.entities.len()
            || self.inheritances.len() != other.inheritances.len()
            || self.relations.len() != other.relations.len()
        {
            return false;
        }

        let entities_equal = self
            .entities
            .values()
            .zip(other.entities.values())
            .all(|(a, b)| a == b);

        let inheritances_equal = self
            .inheritances
            .values()
            .zip(other.inheritances.values())
            .all(|(a, b)| {
                a.open == b.open
                    && a.pt == b.pt
                    && self.resolve(&EndpointTarget::Entity(a.parent))
                        == other.resolve(&EndpointTarget::Entity(b.parent))
            });

        let endpoints_equal = |a: &RelationEndpoint, b: &RelationEndpoint| {
            a.arrow_style == b.arrow_style && self.resolve(&a.target) == other.resolve(&b.target)
        };

        let relations_equal = self
            .relations
            .values()
            .zip(other.relations.values())
            .all(|(a, b)| {
                endpoints_equal(&a.start, &b.start)
                    && endpoints_equal(&a.end, &b.end)
                    && a.control_pts == b.control_pts
                    && a.routing == b.routing
                    && a.label == b.label
                    && a.line_width == b.line_width
                    && a.line_color == b.line_color
                    && a.text_color == b.text_color
                    && a.dash_structure == b.dash_structure
            });

        entities_equal && inheritances_equal && relations_equal
    }
}

impl Eq for Diagram {}
