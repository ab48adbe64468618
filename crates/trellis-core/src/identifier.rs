//! Arena keys for diagram elements.
//!
//! Entities and inheritance nodes are identity objects: two structurally
//! equal entities are still different graph nodes. A [`Diagram`] hands out
//! a key for every element it owns and other elements refer to it through
//! that key, never by value.
//!
//! Keys are only meaningful inside the diagram that issued them. Copying a
//! diagram issues fresh keys in the destination (see [`crate::copy`]).
//!
//! [`Diagram`]: crate::diagram::Diagram

use std::fmt;

macro_rules! element_key {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw arena slot of this key.
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

element_key!(
    /// Key of an [`Entity`](crate::entity::Entity) within its diagram.
    EntityId,
    "entity"
);

element_key!(
    /// Key of an [`Inheritance`](crate::inheritance::Inheritance) within its diagram.
    InheritanceId,
    "inheritance"
);

element_key!(
    /// Key of a [`Relation`](crate::relation::Relation) within its diagram.
    RelationId,
    "relation"
);

/// Monotonic key source owned by a diagram.
///
/// Keys are never reused, so a stale key held by a caller can never alias
/// an element created later. Copies of a diagram continue from the
/// source's next key rather than restarting at zero.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyAllocator {
    next: u32,
}

impl KeyAllocator {
    pub(crate) fn starting_at(next: u32) -> Self {
        Self { next }
    }

    /// The key the next call to [`allocate`](Self::allocate) returns.
    pub(crate) fn peek(&self) -> u32 {
        self.next
    }

    /// Moves past `other`'s keys so neither allocator hands out a key the
    /// other already has.
    pub(crate) fn skip_past(&mut self, other: &KeyAllocator) {
        self.next = self.next.max(other.next);
    }

    pub(crate) fn allocate(&mut self) -> u32 {
        let key = self.next;
        self.next = self
            .next
            .checked_add(1)
            .expect("diagram element keys exhausted");
        key
    }
}
