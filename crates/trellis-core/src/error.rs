//! Referential-integrity errors for the document graph.

use thiserror::Error;

use crate::identifier::{EntityId, InheritanceId, RelationId};

/// A violation of the diagram's structural invariants.
///
/// Returned by [`Diagram::self_check`](crate::diagram::Diagram::self_check)
/// and by operations that would otherwise introduce a dangling reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{context} refers to {id}, which is not in the diagram")]
    DanglingEntity {
        id: EntityId,
        context: &'static str,
    },

    #[error("{context} refers to {id}, which is not in the diagram")]
    DanglingInheritance {
        id: InheritanceId,
        context: &'static str,
    },

    #[error("{relation} has a malformed dash pattern {pattern:?}")]
    MalformedDashPattern {
        relation: RelationId,
        pattern: Vec<u32>,
    },

    #[error("{0} is not in the diagram")]
    UnknownEntity(EntityId),

    #[error("{0} is not in the diagram")]
    UnknownInheritance(InheritanceId),

    #[error("{0} is not in the diagram")]
    UnknownRelation(RelationId),
}
