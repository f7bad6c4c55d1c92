//! Component records and the pool that owns them.
//!
//! Components are located by their own [`ComponentId`], independent of the
//! (entity, type) keying kept by [`ComponentIndex`](crate::ComponentIndex).

use std::{any::Any, fmt, rc::Rc};

use crate::{
    entity::{ComponentId, Entity, TypeHandle},
    identifier::IdentifierAllocator,
    registry::{Payload, TypeDescriptor},
};

/// A component instance: one payload owned by one (entity, type) pair.
pub struct Component {
    id: ComponentId,
    entity: Entity,
    ty: TypeHandle,
    descriptor: Rc<dyn TypeDescriptor>,
    payload: Payload,
}

impl Component {
    #[must_use]
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Owning entity.
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    #[must_use]
    pub const fn ty(&self) -> TypeHandle {
        self.ty
    }

    /// Descriptor that produced the payload.
    #[must_use]
    pub fn descriptor(&self) -> &Rc<dyn TypeDescriptor> {
        &self.descriptor
    }

    #[must_use]
    pub fn payload(&self) -> &dyn Any {
        self.payload.as_ref()
    }

    pub fn payload_mut(&mut self) -> &mut dyn Any {
        self.payload.as_mut()
    }

    /// Payload as `T`, if it is one.
    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    /// Mutable payload as `T`, if it is one.
    pub fn data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.payload.downcast_mut()
    }

    /// Reset the payload through the descriptor's `clear`.
    pub fn clear(&mut self) {
        self.descriptor.clear(self.payload.as_mut());
    }
}

impl Clone for Component {
    /// Deep copy: a fresh payload from `instantiate`, then `copy` into it.
    fn clone(&self) -> Self {
        let mut payload = self.descriptor.instantiate(self.entity, self.id);
        self.descriptor.copy(self.payload.as_ref(), payload.as_mut());
        Self {
            id: self.id,
            entity: self.entity,
            ty: self.ty,
            descriptor: Rc::clone(&self.descriptor),
            payload,
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("ty", &self.ty)
            .field("descriptor", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// Fixed-capacity pool of components keyed by [`ComponentId`].
#[derive(Clone)]
pub struct ComponentRepository {
    ids: IdentifierAllocator,
    slots: Vec<Option<Component>>,
}

impl ComponentRepository {
    /// Create an empty pool with room for `capacity` components.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            ids: IdentifierAllocator::new(capacity),
            slots,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.ids.capacity()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.ids.is_full()
    }

    /// Id the next [`create`](Self::create) will use, without reserving it.
    pub fn next_id(&mut self) -> Option<ComponentId> {
        self.ids.next().map(ComponentId::from_index)
    }

    /// Create a component for (`entity`, `ty`) with a payload from `descriptor`.
    ///
    /// Returns `None` when the pool is full. Does not check pair uniqueness.
    pub fn create(
        &mut self,
        entity: Entity,
        ty: TypeHandle,
        descriptor: &Rc<dyn TypeDescriptor>,
    ) -> Option<ComponentId> {
        let index = self.ids.next()?;
        let id = ComponentId::from_index(index);

        self.ids.add(index);
        self.slots[index] = Some(Component {
            id,
            entity,
            ty,
            descriptor: Rc::clone(descriptor),
            payload: descriptor.instantiate(entity, id),
        });
        Some(id)
    }

    /// Free the slot, handing the record back. No destructor hook runs.
    pub fn delete(&mut self, id: ComponentId) -> Option<Component> {
        if !self.ids.delete(id.index()) {
            return None;
        }
        self.slots[id.index()].take()
    }

    #[must_use]
    pub fn has(&self, id: ComponentId) -> bool {
        self.ids.has(id.index())
    }

    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// The component, only if its type is `expected`.
    #[must_use]
    pub fn get_typed(&self, id: ComponentId, expected: TypeHandle) -> Option<&Component> {
        self.get(id).filter(|component| component.ty == expected)
    }

    /// Iterate over live components in dense id order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> + '_ {
        self.ids.iter().filter_map(|index| self.slots[index].as_ref())
    }

    /// Iterate over live component ids.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = ComponentId> + '_ {
        self.ids.iter().map(ComponentId::from_index)
    }

    /// Resize to `capacity`, dropping every component with an id at or above it.
    ///
    /// Returns the dropped components.
    pub fn reallocate(&mut self, capacity: usize) -> Vec<Component> {
        let doomed: Vec<ComponentId> = self.ids().filter(|id| id.index() >= capacity).collect();
        let dropped = doomed.into_iter().filter_map(|id| self.delete(id)).collect();

        self.ids.reallocate(capacity);
        self.slots.truncate(capacity);
        self.slots.resize_with(capacity, || None);
        dropped
    }
}

impl fmt::Debug for ComponentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
