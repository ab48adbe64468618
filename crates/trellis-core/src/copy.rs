//! Isomorphism-preserving filtered copies of diagrams.
//!
//! [`copy_filtered`] produces a new [`Diagram`] holding the subset of a
//! source diagram accepted by a [`CopyFilter`]. The result is closed: every
//! reference in it points at an element the result itself owns, and none
//! of its state is shared with the source.
//!
//! The same engine serves three purposes:
//!
//! - clipboard copy and cut, filtering by a [`Selection`];
//! - pasting, which appends a copy of a clipboard diagram to a target;
//! - full snapshots ([`Diagram::deep_copy`]), filtering with [`CopyAll`].
//!
//! # Selection rules
//!
//! 1. Entities passing the filter are kept, in z-order.
//! 2. Inheritance nodes are kept only if they pass *and* their parent was
//!    kept.
//! 3. Relations are kept only if they pass *and* neither endpoint refers to
//!    an entity or inheritance node that was dropped. Free-point endpoints
//!    never cause a drop.
//!
//! # Example
//!
//! ```
//! use trellis_core::{
//!     copy::{Selection, copy_filtered},
//!     diagram::Diagram,
//!     entity::Entity,
//!     relation::Relation,
//! };
//!
//! let mut diagram = Diagram::new();
//! let a = diagram.add_entity(Entity::default().with_name("a"));
//! let b = diagram.add_entity(Entity::default().with_name("b"));
//! diagram.add_relation(Relation::between_entities(a, b)).unwrap();
//!
//! let mut selection = Selection::new();
//! selection.insert_entity(a);
//!
//! let clip = copy_filtered(&diagram, &selection);
//! assert_eq!(clip.entity_count(), 1);
//! // The relation's other end was not selected.
//! assert_eq!(clip.relation_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    diagram::Diagram,
    entity::Entity,
    identifier::{EntityId, InheritanceId, RelationId},
    inheritance::Inheritance,
    relation::{EndpointTarget, Relation, RelationEndpoint},
};

/// Per-category predicates deciding which elements a copy keeps.
///
/// Every method defaults to keeping the element.
pub trait CopyFilter {
    fn keep_entity(&self, _id: EntityId, _entity: &Entity) -> bool {
        true
    }

    fn keep_inheritance(&self, _id: InheritanceId, _inheritance: &Inheritance) -> bool {
        true
    }

    fn keep_relation(&self, _id: RelationId, _relation: &Relation) -> bool {
        true
    }
}

/// Filter that keeps everything; used for snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyAll;

impl CopyFilter for CopyAll {}

/// Filter built from three closures.
///
/// # Examples
///
/// ```
/// use trellis_core::{copy::Predicates, entity::Entity, identifier::EntityId};
///
/// // Keep only entities named "db" (and whatever connects them).
/// let filter = Predicates::entities(|_: EntityId, e: &Entity| e.name == "db");
/// ```
pub struct Predicates<E, I, R> {
    entity: E,
    inheritance: I,
    relation: R,
}

impl<E, I, R> Predicates<E, I, R>
where
    E: Fn(EntityId, &Entity) -> bool,
    I: Fn(InheritanceId, &Inheritance) -> bool,
    R: Fn(RelationId, &Relation) -> bool,
{
    pub fn new(entity: E, inheritance: I, relation: R) -> Self {
        Self {
            entity,
            inheritance,
            relation,
        }
    }
}

type KeepInheritance = fn(InheritanceId, &Inheritance) -> bool;
type KeepRelation = fn(RelationId, &Relation) -> bool;

impl<E> Predicates<E, KeepInheritance, KeepRelation>
where
    E: Fn(EntityId, &Entity) -> bool,
{
    /// Filters entities only; inheritances and relations pass whenever the
    /// elements they reference were kept.
    pub fn entities(entity: E) -> Self {
        Self {
            entity,
            inheritance: |_, _| true,
            relation: |_, _| true,
        }
    }
}

impl<E, I, R> CopyFilter for Predicates<E, I, R>
where
    E: Fn(EntityId, &Entity) -> bool,
    I: Fn(InheritanceId, &Inheritance) -> bool,
    R: Fn(RelationId, &Relation) -> bool,
{
    fn keep_entity(&self, id: EntityId, entity: &Entity) -> bool {
        (self.entity)(id, entity)
    }

    fn keep_inheritance(&self, id: InheritanceId, inheritance: &Inheritance) -> bool {
        (self.inheritance)(id, inheritance)
    }

    fn keep_relation(&self, id: RelationId, relation: &Relation) -> bool {
        (self.relation)(id, relation)
    }
}

/// A set of selected elements, by key.
///
/// As a [`CopyFilter`] it keeps exactly the selected elements (subject to
/// the usual closure rules). Pasting returns the keys of the pasted
/// elements as a new selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entities: HashSet<EntityId>,
    inheritances: HashSet<InheritanceId>,
    relations: HashSet<RelationId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects every element of `diagram`.
    pub fn all(diagram: &Diagram) -> Self {
        Self {
            entities: diagram.entity_ids().collect(),
            inheritances: diagram.inheritance_ids().collect(),
            relations: diagram.relation_ids().collect(),
        }
    }

    pub fn insert_entity(&mut self, id: EntityId) -> bool {
        self.entities.insert(id)
    }

    pub fn insert_inheritance(&mut self, id: InheritanceId) -> bool {
        self.inheritances.insert(id)
    }

    pub fn insert_relation(&mut self, id: RelationId) -> bool {
        self.relations.insert(id)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(&id)
    }

    pub fn contains_inheritance(&self, id: InheritanceId) -> bool {
        self.inheritances.contains(&id)
    }

    pub fn contains_relation(&self, id: RelationId) -> bool {
        self.relations.contains(&id)
    }

    /// Selected entity keys, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.inheritances.is_empty() && self.relations.is_empty()
    }

    /// Total number of selected elements.
    pub fn len(&self) -> usize {
        self.entities.len() + self.inheritances.len() + self.relations.len()
    }
}

impl CopyFilter for Selection {
    fn keep_entity(&self, id: EntityId, _entity: &Entity) -> bool {
        self.contains_entity(id)
    }

    fn keep_inheritance(&self, id: InheritanceId, _inheritance: &Inheritance) -> bool {
        self.contains_inheritance(id)
    }

    fn keep_relation(&self, id: RelationId, _relation: &Relation) -> bool {
        self.contains_relation(id)
    }
}

/// Copies the subset of `source` accepted by `filter` into a new diagram.
///
/// Diagram-level properties (window size, colors, flags) are copied as
/// well. The result shares no state with `source`, and none of its keys
/// were ever issued by `source`: a key taken from `source` resolves to
/// nothing in the copy.
pub fn copy_filtered(source: &Diagram, filter: &impl CopyFilter) -> Diagram {
    copy_into(source, filter, Diagram::empty_successor(source))
}

fn copy_into(source: &Diagram, filter: &impl CopyFilter, mut dest: Diagram) -> Diagram {
    dest.set_window_size(source.window_size());
    dest.set_draw_file_name(source.draw_file_name());
    dest.set_background_color(source.background_color());
    dest.set_named_colors(source.named_colors().clone());

    copy_elements(source, filter, &mut dest);
    dest
}

/// Appends a copy of every element of `clipboard` to `target`.
///
/// Returns the keys of the new elements in `target`, which is what an
/// editor selects after pasting. Diagram-level properties of `target` are
/// left alone.
pub fn paste_into(target: &mut Diagram, clipboard: &Diagram) -> Selection {
    target.skip_keys_of(clipboard);
    copy_elements(clipboard, &CopyAll, target)
}

/// Copies the selected elements out of `source` and then removes them.
///
/// Removal is cascade-aware, so relations attached to a cut entity leave
/// the source even when they were not selected; only those whose both ends
/// were copied appear in the returned clipboard.
pub fn cut_selection(source: &mut Diagram, selection: &Selection) -> Diagram {
    let clipboard = copy_filtered(source, selection);

    let relations: Vec<RelationId> = source
        .relation_ids()
        .filter(|id| selection.contains_relation(*id))
        .collect();
    for id in relations {
        source
            .remove_relation(id)
            .expect("selected relation was listed from the source");
    }

    let inheritances: Vec<InheritanceId> = source
        .inheritance_ids()
        .filter(|id| selection.contains_inheritance(*id))
        .collect();
    // Removing a node takes its attached relations along; listing the
    // remaining entities afterwards keeps every key below live.
    for id in inheritances {
        source
            .remove_inheritance(id)
            .expect("selected inheritance was listed from the source");
    }

    let entities: Vec<EntityId> = source
        .entity_ids()
        .filter(|id| selection.contains_entity(*id))
        .collect();
    for id in entities {
        source
            .remove_entity(id)
            .expect("selected entity was listed from the source");
    }

    source.assert_valid();
    clipboard
}

impl Diagram {
    /// Returns a structurally equal diagram that shares no state with
    /// `self`.
    pub fn deep_copy(&self) -> Diagram {
        copy_filtered(self, &CopyAll)
    }

    /// Deep copy whose keys also continue past every key `predecessor` has
    /// issued.
    ///
    /// Use it when the copy replaces `predecessor`, as restoring an undo
    /// snapshot does: keys handed out by `predecessor` then resolve to
    /// nothing in the copy.
    pub fn deep_copy_after(&self, predecessor: &Diagram) -> Diagram {
        let mut dest = Diagram::empty_successor(self);
        dest.skip_keys_of(predecessor);
        copy_into(self, &CopyAll, dest)
    }
}

/// Core of the engine: clones the accepted subset of `source` into `dest`
/// and returns the keys it created there.
fn copy_elements(source: &Diagram, filter: &impl CopyFilter, dest: &mut Diagram) -> Selection {
    let mut created = Selection::new();

    let mut entity_map: HashMap<EntityId, EntityId> = HashMap::new();
    for (old_id, entity) in source.entities() {
        if filter.keep_entity(old_id, entity) {
            let new_id = dest.add_entity(entity.clone());
            entity_map.insert(old_id, new_id);
            created.insert_entity(new_id);
        }
    }

    let mut inheritance_map: HashMap<InheritanceId, InheritanceId> = HashMap::new();
    for (old_id, inh) in source.inheritances() {
        let Some(&parent) = entity_map.get(&inh.parent) else {
            continue;
        };
        if !filter.keep_inheritance(old_id, inh) {
            continue;
        }
        let new_id = dest
            .add_inheritance(Inheritance::new(parent, inh.open, inh.pt))
            .expect("parent was copied into the destination");
        inheritance_map.insert(old_id, new_id);
        created.insert_inheritance(new_id);
    }

    let mut dropped_relations = 0usize;
    for (old_id, rel) in source.relations() {
        if !filter.keep_relation(old_id, rel) {
            continue;
        }
        let remap = |endpoint: &RelationEndpoint| -> Option<RelationEndpoint> {
            let target = match endpoint.target {
                EndpointTarget::Entity(id) => EndpointTarget::Entity(*entity_map.get(&id)?),
                EndpointTarget::Inheritance(id) => {
                    EndpointTarget::Inheritance(*inheritance_map.get(&id)?)
                }
                EndpointTarget::Point(pt) => EndpointTarget::Point(pt),
            };
            Some(RelationEndpoint::new(target, endpoint.arrow_style))
        };
        let (Some(start), Some(end)) = (remap(&rel.start), remap(&rel.end)) else {
            dropped_relations += 1;
            continue;
        };

        let copy = Relation {
            start,
            end,
            ..rel.clone()
        };
        let new_id = dest
            .add_relation(copy)
            .expect("relation endpoints were remapped into the destination");
        created.insert_relation(new_id);
    }

    debug!(
        entities = entity_map.len(),
        inheritances = inheritance_map.len(),
        relations = created.relations.len(),
        dropped_relations = dropped_relations;
        "Copied diagram elements"
    );

    created
}
