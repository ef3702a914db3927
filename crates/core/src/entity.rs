//! Entity trait: identity that survives state changes.
//!
//! Customers keep their id while their balance moves; transactions keep theirs
//! for life. Collections of entities are looked up by that id.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Position of the entity with `id` in an ordered collection.
pub fn position_of<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// First id that appears more than once in `items`, if any.
pub fn first_duplicate_id<E: Entity>(items: &[E]) -> Option<E::Id> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| item.id().clone())
        .find(|id| !seen.insert(id.clone()))
}
