//! # Entity Ids — Stable Identifiers for Materia
//!
//! An [`EntityId`] is a plain integer. Scene documents refer to entities by
//! these ids (`id`, `parentId`, button `targetId`), so an id must survive a
//! save/load cycle unchanged.
//!
//! ## Design: Monotonic, Scene-Owned Allocation
//!
//! A recycling allocator (free list plus generations) would hand out ids that
//! a saved document may still mention. Ids here are never reused: the
//! allocator only counts up.
//!
//! ```text
//! spawn  → #1, #2, #3
//! remove #2
//! spawn  → #4          ← #2 is never handed out again
//! load document with ids {10, 11}
//! spawn  → #12         ← allocator skips past loaded ids
//! ```
//!
//! Each [`Scene`](super::Scene) owns its allocator, so independent scenes
//! (and tests) never share a counter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a [`Materia`](super::Materia) within its scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out [`EntityId`]s in increasing order, starting at 1.
///
/// Once `u32::MAX` has been handed out (or reserved) the allocator is
/// exhausted and [`allocate`](Self::allocate) returns `None` for good.
#[derive(Debug, Clone)]
pub(crate) struct IdAllocator {
    next: Option<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: Some(1) }
    }

    pub fn allocate(&mut self) -> Option<EntityId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(EntityId(id))
    }

    /// Make sure `id` (and everything below it) is never allocated.
    pub fn reserve(&mut self, id: EntityId) {
        if let Some(next) = self.next {
            if id.0 >= next {
                self.next = id.0.checked_add(1);
            }
        }
    }

    /// The id the next [`allocate`](Self::allocate) returns.
    pub fn peek(&self) -> Option<EntityId> {
        self.next.map(EntityId)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_is_monotonic() {
        let mut alloc = IdAllocator::new();
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));
        assert!(b > a);
    }

    #[test]
    fn reserve_skips_past_loaded_ids() {
        let mut alloc = IdAllocator::new();
        alloc.reserve(EntityId(41));
        assert_eq!(alloc.allocate(), Some(EntityId(42)));

        // Reserving something already passed is a no-op.
        alloc.reserve(EntityId(3));
        assert_eq!(alloc.allocate(), Some(EntityId(43)));
    }

    #[test]
    fn exhausted_after_the_largest_id() {
        let mut alloc = IdAllocator::new();
        alloc.reserve(EntityId(u32::MAX - 1));
        assert_eq!(alloc.allocate(), Some(EntityId(u32::MAX)));
        assert_eq!(alloc.allocate(), None);
        assert_eq!(alloc.peek(), None);

        let mut loaded = IdAllocator::new();
        loaded.reserve(EntityId(u32::MAX));
        assert_eq!(loaded.allocate(), None);
        // Stays exhausted.
        loaded.reserve(EntityId(7));
        assert_eq!(loaded.allocate(), None);
    }

    #[test]
    fn display_and_serde() {
        assert_eq!(EntityId(5).to_string(), "#5");
        assert_eq!(serde_json::to_value(EntityId(5)).unwrap(), serde_json::json!(5));
        let id: EntityId = serde_json::from_value(serde_json::json!(9)).unwrap();
        assert_eq!(id, EntityId(9));
    }
}
