//! Tag x entity relation.
//!
//! Each tag slot owns an [`IdentifierAllocator`] of the entities carrying it.
//! Tag-side queries are O(1)/O(k); entity-side queries scan every tag slot,
//! which is cheap because the tag pool is small.

use smallvec::SmallVec;

use crate::{
    entity::{Entity, Tag},
    identifier::IdentifierAllocator,
};

/// Many-to-many boolean relation between tags and entities.
#[derive(Debug, Clone)]
pub struct TagRelations {
    entities: usize,
    slots: Vec<IdentifierAllocator>,
}

impl TagRelations {
    /// Create an empty relation for `entities` entity slots and `tags` tag slots.
    #[must_use]
    pub fn new(entities: usize, tags: usize) -> Self {
        Self {
            entities,
            slots: vec![IdentifierAllocator::new(entities); tags],
        }
    }

    #[must_use]
    pub const fn entity_capacity(&self) -> usize {
        self.entities
    }

    #[must_use]
    pub fn tag_capacity(&self) -> usize {
        self.slots.len()
    }

    /// Attach `tag` to `entity`. Returns `false` if already attached or out of range.
    pub fn attach(&mut self, tag: Tag, entity: Entity) -> bool {
        self.slots
            .get_mut(tag.index())
            .is_some_and(|slot| slot.add(entity.index()))
    }

    /// Detach `tag` from `entity`. Returns `false` if it was not attached.
    pub fn detach(&mut self, tag: Tag, entity: Entity) -> bool {
        self.slots
            .get_mut(tag.index())
            .is_some_and(|slot| slot.delete(entity.index()))
    }

    #[must_use]
    pub fn has(&self, tag: Tag, entity: Entity) -> bool {
        self.slots
            .get(tag.index())
            .is_some_and(|slot| slot.has(entity.index()))
    }

    /// Detach every tag from `entity`, returning the tags it carried.
    pub fn detach_all(&mut self, entity: Entity) -> SmallVec<[Tag; 8]> {
        let mut detached = SmallVec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.delete(entity.index()) {
                detached.push(Tag::from_index(index));
            }
        }
        detached
    }

    /// Detach `tag` from every entity, returning how many carried it.
    pub fn detach_from_its_entities(&mut self, tag: Tag) -> usize {
        let Some(slot) = self.slots.get_mut(tag.index()) else {
            return 0;
        };
        let count = slot.len();
        slot.clear();
        count
    }

    /// Entities carrying `tag`.
    pub fn entities_with_tag(&self, tag: Tag) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.slots
            .get(tag.index())
            .map(IdentifierAllocator::iter)
            .unwrap_or_default()
            .map(Entity::from_index)
    }

    /// Tags carried by `entity`. Scans every tag slot.
    pub fn tags_of_entity(&self, entity: Entity) -> impl Iterator<Item = Tag> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.has(entity.index()))
            .map(|(index, _)| Tag::from_index(index))
    }

    /// Resize both dimensions, keeping every relation that still fits.
    pub fn reallocate(&mut self, entities: usize, tags: usize) {
        self.slots
            .resize_with(tags, || IdentifierAllocator::new(entities));
        for slot in &mut self.slots {
            slot.reallocate(entities);
        }
        self.entities = entities;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted<T: Ord>(iter: impl Iterator<Item = T>) -> Vec<T> {
        let mut items: Vec<T> = iter.collect();
        items.sort_unstable();
        items
    }

    #[test]
    fn test_attach_detach_has() {
        let mut relations = TagRelations::new(8, 4);
        let (tag, entity) = (Tag::new(1), Entity::new(5));

        assert!(relations.attach(tag, entity));
        assert!(!relations.attach(tag, entity));
        assert!(relations.has(tag, entity));

        assert!(relations.detach(tag, entity));
        assert!(!relations.detach(tag, entity));
        assert!(!relations.has(tag, entity));
    }

    #[test]
    fn test_out_of_range() {
        let mut relations = TagRelations::new(2, 2);

        assert!(!relations.attach(Tag::new(2), Entity::new(0)));
        assert!(!relations.attach(Tag::new(0), Entity::new(2)));
        assert!(!relations.has(Tag::new(7), Entity::new(0)));
        assert_eq!(relations.entities_with_tag(Tag::new(7)).count(), 0);
        assert_eq!(relations.detach_from_its_entities(Tag::new(7)), 0);
    }

    #[test]
    fn test_both_directions() {
        let mut relations = TagRelations::new(8, 4);
        relations.attach(Tag::new(0), Entity::new(3));
        relations.attach(Tag::new(2), Entity::new(3));
        relations.attach(Tag::new(2), Entity::new(6));

        assert_eq!(
            sorted(relations.entities_with_tag(Tag::new(2))),
            vec![Entity::new(3), Entity::new(6)]
        );
        assert_eq!(
            sorted(relations.tags_of_entity(Entity::new(3))),
            vec![Tag::new(0), Tag::new(2)]
        );
        assert_eq!(relations.tags_of_entity(Entity::new(1)).count(), 0);
    }

    #[test]
    fn test_detach_all() {
        let mut relations = TagRelations::new(8, 4);
        relations.attach(Tag::new(0), Entity::new(1));
        relations.attach(Tag::new(3), Entity::new(1));
        relations.attach(Tag::new(3), Entity::new(2));

        let detached = relations.detach_all(Entity::new(1));

        assert_eq!(detached.as_slice(), &[Tag::new(0), Tag::new(3)]);
        assert_eq!(relations.tags_of_entity(Entity::new(1)).count(), 0);
        assert!(relations.has(Tag::new(3), Entity::new(2)));
    }

    #[test]
    fn test_detach_from_its_entities() {
        let mut relations = TagRelations::new(8, 2);
        relations.attach(Tag::new(1), Entity::new(0));
        relations.attach(Tag::new(1), Entity::new(7));
        relations.attach(Tag::new(0), Entity::new(7));

        assert_eq!(relations.detach_from_its_entities(Tag::new(1)), 2);

        assert_eq!(relations.entities_with_tag(Tag::new(1)).count(), 0);
        assert!(relations.has(Tag::new(0), Entity::new(7)));
    }

    #[test]
    fn test_reallocate() {
        let mut relations = TagRelations::new(8, 4);
        relations.attach(Tag::new(0), Entity::new(1));
        relations.attach(Tag::new(0), Entity::new(6));
        relations.attach(Tag::new(3), Entity::new(1));

        relations.reallocate(4, 2);

        assert_eq!(relations.tag_capacity(), 2);
        assert_eq!(relations.entity_capacity(), 4);
        assert_eq!(sorted(relations.entities_with_tag(Tag::new(0))), vec![Entity::new(1)]);
        assert!(!relations.has(Tag::new(3), Entity::new(1)));

        relations.reallocate(16, 8);
        assert!(relations.attach(Tag::new(7), Entity::new(15)));
        assert!(relations.has(Tag::new(0), Entity::new(1)));
    }
}
