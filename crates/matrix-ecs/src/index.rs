//! Entity x type lookup matrix.
//!
//! ```text
//!             type 0   type 1   type 2
//! entity 0  [   0   |   4    |   0   ]   types_by_entity[0] = {1}
//! entity 1  [   1   |   0    |   3   ]   types_by_entity[1] = {0, 2}
//!
//! entities_by_type[0] = {1}, [1] = {0}, [2] = {1}
//! ```
//!
//! Cells hold `component id + 1`; zero marks an empty cell. The side
//! allocators answer existence in O(1) and enumerate a row or column in
//! O(k) without scanning the matrix.

use std::fmt;

use crate::{
    entity::{ComponentId, Entity, TypeHandle},
    identifier::IdentifierAllocator,
};

const EMPTY: u32 = 0;

/// Lookup from (entity, type) to component id, queryable in both directions.
#[derive(Clone)]
pub struct ComponentIndex {
    entities: usize,
    types: usize,
    /// Row-major `entities x types` cells.
    cells: Vec<u32>,
    types_by_entity: Vec<IdentifierAllocator>,
    entities_by_type: Vec<IdentifierAllocator>,
}

impl ComponentIndex {
    /// Create an empty index for `entities` entity slots and `types` type slots.
    #[must_use]
    pub fn new(entities: usize, types: usize) -> Self {
        Self {
            entities,
            types,
            cells: vec![EMPTY; entities * types],
            types_by_entity: vec![IdentifierAllocator::new(types); entities],
            entities_by_type: vec![IdentifierAllocator::new(entities); types],
        }
    }

    #[must_use]
    pub const fn entity_capacity(&self) -> usize {
        self.entities
    }

    #[must_use]
    pub const fn type_capacity(&self) -> usize {
        self.types
    }

    #[inline]
    fn cell(&self, entity: Entity, ty: TypeHandle) -> Option<usize> {
        let (entity, ty) = (entity.index(), ty.index());
        (entity < self.entities && ty < self.types).then(|| entity * self.types + ty)
    }

    /// Record `id` as the component of `entity` for `ty`.
    ///
    /// Overwrites any previous id and returns it. Out-of-range pairs are
    /// ignored.
    pub fn set(&mut self, entity: Entity, ty: TypeHandle, id: ComponentId) -> Option<ComponentId> {
        let cell = self.cell(entity, ty)?;
        let previous = decode(self.cells[cell]);

        self.cells[cell] = id.raw() + 1;
        self.types_by_entity[entity.index()].add(ty.index());
        self.entities_by_type[ty.index()].add(entity.index());
        previous
    }

    /// Clear the pair, returning the id it held.
    pub fn delete(&mut self, entity: Entity, ty: TypeHandle) -> Option<ComponentId> {
        let cell = self.cell(entity, ty)?;
        let previous = decode(self.cells[cell]);

        self.cells[cell] = EMPTY;
        self.types_by_entity[entity.index()].delete(ty.index());
        self.entities_by_type[ty.index()].delete(entity.index());
        previous
    }

    /// Component id held by the pair.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity, ty: TypeHandle) -> Option<ComponentId> {
        decode(self.cells[self.cell(entity, ty)?])
    }

    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity, ty: TypeHandle) -> bool {
        self.entities_by_type
            .get(ty.index())
            .is_some_and(|entities| entities.has(entity.index()))
    }

    /// Types present on `entity`.
    ///
    /// Borrowed view; collect it before mutating the index.
    pub fn types_of_entity(&self, entity: Entity) -> impl ExactSizeIterator<Item = TypeHandle> + '_ {
        self.types_by_entity
            .get(entity.index())
            .map(IdentifierAllocator::iter)
            .unwrap_or_default()
            .map(TypeHandle::from_index)
    }

    /// Entities holding a component of `ty`.
    ///
    /// Borrowed view; collect it before mutating the index.
    pub fn entities_with_type(&self, ty: TypeHandle) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.entities_by_type
            .get(ty.index())
            .map(IdentifierAllocator::iter)
            .unwrap_or_default()
            .map(Entity::from_index)
    }

    /// Resize both dimensions, keeping every pair that still fits.
    pub fn reallocate(&mut self, entities: usize, types: usize) {
        let mut cells = vec![EMPTY; entities * types];
        let kept_entities = self.entities.min(entities);
        let kept_types = self.types.min(types);
        for entity in 0..kept_entities {
            let from = entity * self.types;
            let to = entity * types;
            cells[to..to + kept_types].copy_from_slice(&self.cells[from..from + kept_types]);
        }

        self.types_by_entity
            .resize_with(entities, || IdentifierAllocator::new(types));
        for row in &mut self.types_by_entity {
            row.reallocate(types);
        }
        self.entities_by_type
            .resize_with(types, || IdentifierAllocator::new(entities));
        for column in &mut self.entities_by_type {
            column.reallocate(entities);
        }

        self.cells = cells;
        self.entities = entities;
        self.types = types;
    }
}

const fn decode(cell: u32) -> Option<ComponentId> {
    match cell {
        EMPTY => None,
        stored => Some(ComponentId::new(stored - 1)),
    }
}

impl fmt::Debug for ComponentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentIndex")
            .field("entities", &self.entities)
            .field("types", &self.types)
            .field(
                "pairs",
                &self.entities_by_type.iter().map(IdentifierAllocator::len).sum::<usize>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(raw: u32) -> Entity {
        Entity::new(raw)
    }

    fn t(raw: u32) -> TypeHandle {
        TypeHandle::new(raw)
    }

    fn c(raw: u32) -> ComponentId {
        ComponentId::new(raw)
    }

    fn sorted<T: Ord>(iter: impl Iterator<Item = T>) -> Vec<T> {
        let mut items: Vec<T> = iter.collect();
        items.sort_unstable();
        items
    }

    #[test]
    fn test_set_get_has() {
        let mut index = ComponentIndex::new(4, 3);

        assert_eq!(index.set(e(1), t(2), c(0)), None);

        assert!(index.has(e(1), t(2)));
        assert_eq!(index.get(e(1), t(2)), Some(c(0)));
        assert!(!index.has(e(1), t(1)));
        assert_eq!(index.get(e(1), t(1)), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut index = ComponentIndex::new(2, 2);

        index.set(e(0), t(0), c(5));
        assert_eq!(index.set(e(0), t(0), c(9)), Some(c(5)));
        assert_eq!(index.get(e(0), t(0)), Some(c(9)));
        assert_eq!(index.types_of_entity(e(0)).len(), 1);
    }

    #[test]
    fn test_delete_clears_both_sides() {
        let mut index = ComponentIndex::new(4, 4);
        index.set(e(0), t(1), c(0));
        index.set(e(2), t(1), c(1));

        assert_eq!(index.delete(e(0), t(1)), Some(c(0)));

        assert!(!index.has(e(0), t(1)));
        assert_eq!(index.types_of_entity(e(0)).count(), 0);
        assert_eq!(sorted(index.entities_with_type(t(1))), vec![e(2)]);
        assert_eq!(index.delete(e(0), t(1)), None);
    }

    #[test]
    fn test_forward_and_reverse_agree() {
        let mut index = ComponentIndex::new(4, 4);
        let pairs = [(0, 0), (0, 3), (1, 3), (3, 2), (3, 3)];
        for (id, (entity, ty)) in pairs.into_iter().enumerate() {
            index.set(e(entity), t(ty), c(id as u32));
        }

        for entity in 0..4 {
            for ty in index.types_of_entity(e(entity)) {
                assert!(index.entities_with_type(ty).any(|other| other == e(entity)));
            }
        }
        for ty in 0..4 {
            for entity in index.entities_with_type(t(ty)) {
                assert!(index.types_of_entity(entity).any(|other| other == t(ty)));
            }
        }

        assert_eq!(sorted(index.types_of_entity(e(3))), vec![t(2), t(3)]);
        assert_eq!(sorted(index.entities_with_type(t(3))), vec![e(0), e(1), e(3)]);
    }

    #[test]
    fn test_component_id_zero_is_not_empty() {
        let mut index = ComponentIndex::new(1, 1);
        index.set(e(0), t(0), c(0));
        assert_eq!(index.get(e(0), t(0)), Some(c(0)));
    }

    #[test]
    fn test_out_of_range_queries() {
        let mut index = ComponentIndex::new(2, 2);

        assert_eq!(index.set(e(5), t(0), c(0)), None);
        assert!(!index.has(e(5), t(0)));
        assert!(!index.has(e(0), t(5)));
        assert_eq!(index.get(e(5), t(5)), None);
        assert_eq!(index.types_of_entity(e(9)).count(), 0);
        assert_eq!(index.entities_with_type(t(9)).count(), 0);
    }

    #[test]
    fn test_reallocate_grow_keeps_pairs() {
        let mut index = ComponentIndex::new(2, 2);
        index.set(e(0), t(1), c(3));
        index.set(e(1), t(0), c(4));

        index.reallocate(8, 5);

        assert_eq!(index.get(e(0), t(1)), Some(c(3)));
        assert_eq!(index.get(e(1), t(0)), Some(c(4)));
        assert_eq!(sorted(index.types_of_entity(e(0))), vec![t(1)]);

        index.set(e(7), t(4), c(5));
        assert_eq!(index.get(e(7), t(4)), Some(c(5)));
        assert_eq!(index.get(e(0), t(4)), None);
    }

    #[test]
    fn test_reallocate_shrink_drops_pairs() {
        let mut index = ComponentIndex::new(4, 4);
        index.set(e(0), t(0), c(0));
        index.set(e(0), t(3), c(1));
        index.set(e(3), t(0), c(2));

        index.reallocate(2, 2);

        assert_eq!(index.get(e(0), t(0)), Some(c(0)));
        assert!(!index.has(e(0), t(3)));
        assert!(!index.has(e(3), t(0)));
        assert_eq!(sorted(index.types_of_entity(e(0))), vec![t(0)]);
        assert_eq!(sorted(index.entities_with_type(t(0))), vec![e(0)]);
    }
}
