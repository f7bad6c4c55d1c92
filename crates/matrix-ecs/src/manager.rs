//! Manager - the single mutation entry point.
//!
//! The manager owns every pool and index and keeps them consistent. Each
//! mutation runs the same protocol:
//!
//! 1. **validate**: return `Err` before touching any state
//! 2. **will**: `manager_will_*` on every system, in registration order
//! 3. **mutate**: apply the change across the owned structures
//! 4. **did**: `manager_did_*` on every system, in registration order
//!
//! Cascading deletes (entity, type, tag) go through the single-step public
//! operations, so systems see a full will/did pair for every component
//! removed and every tag detached.
//!
//! The system list is snapshotted at the start of each broadcast. A system
//! is taken out of its slot while it runs and put back afterwards, so it is
//! never notified of changes it makes itself from [`System::update`].

use std::{fmt, rc::Rc};

use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use crate::{
    config::{Capacities, ManagerBuilder},
    entity::{ComponentId, Entity, SystemId, Tag, TypeHandle},
    error::{EcsError, EcsResult, Pool},
    identifier::IdentifierAllocator,
    index::ComponentIndex,
    registry::{TypeDescriptor, TypeRegistry},
    repository::{Component, ComponentRepository},
    system::System,
    tags::TagRelations,
};

type SystemIds = SmallVec<[SystemId; 8]>;

struct SystemSlot {
    id: SystemId,
    /// `None` while the system is running.
    system: Option<Box<dyn System>>,
}

/// Fixed-capacity registry of entities, tags, types and components.
pub struct Manager {
    capacities: Capacities,
    entities: IdentifierAllocator,
    tags: IdentifierAllocator,
    types: TypeRegistry,
    index: ComponentIndex,
    relations: TagRelations,
    components: ComponentRepository,
    /// Sorted by id; ids are handed out in increasing order.
    systems: Vec<SystemSlot>,
    next_system: u32,
}

impl Default for Manager {
    fn default() -> Self {
        Self::with_capacities(Capacities::default())
    }
}

impl Manager {
    /// Create a manager with the given capacities.
    pub fn new(capacities: Capacities) -> EcsResult<Self> {
        capacities.validate()?;
        Ok(Self::with_capacities(capacities))
    }

    #[must_use]
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    fn with_capacities(capacities: Capacities) -> Self {
        Self {
            capacities,
            entities: IdentifierAllocator::new(capacities.entities),
            tags: IdentifierAllocator::new(capacities.tags),
            types: TypeRegistry::new(capacities.types),
            index: ComponentIndex::new(capacities.entities, capacities.types),
            relations: TagRelations::new(capacities.entities, capacities.tags),
            components: ComponentRepository::new(capacities.components),
            systems: Vec::new(),
            next_system: 0,
        }
    }

    #[must_use]
    pub const fn capacities(&self) -> Capacities {
        self.capacities
    }

    fn capacity_exceeded(&self, pool: Pool) -> EcsError {
        EcsError::CapacityExceeded {
            pool,
            capacity: self.capacities.get(pool),
        }
    }

    fn require_entity(&self, entity: Entity) -> EcsResult<()> {
        if self.has_entity(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotFound(entity))
        }
    }

    fn require_tag(&self, tag: Tag) -> EcsResult<()> {
        if self.has_tag(tag) {
            Ok(())
        } else {
            Err(EcsError::TagNotFound(tag))
        }
    }

    fn require_type(&self, ty: TypeHandle) -> EcsResult<()> {
        if self.has_type(ty) {
            Ok(())
        } else {
            Err(EcsError::TypeNotFound(ty))
        }
    }

    // ==================== Notification ====================

    fn system_snapshot(&self) -> SystemIds {
        self.systems.iter().map(|slot| slot.id).collect()
    }

    fn slot_position(&self, id: SystemId) -> Option<usize> {
        self.systems
            .binary_search_by_key(&id, |slot| slot.id)
            .ok()
    }

    fn take_system(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        let position = self.slot_position(id)?;
        self.systems[position].system.take()
    }

    fn restore_system(&mut self, id: SystemId, system: Box<dyn System>) {
        if let Some(position) = self.slot_position(id) {
            self.systems[position].system = Some(system);
        }
    }

    /// Run `hook` on each listed system still registered and not running.
    fn run_systems(&mut self, ids: &[SystemId], mut hook: impl FnMut(&mut dyn System, &mut Self)) {
        for &id in ids {
            let Some(mut system) = self.take_system(id) else {
                continue;
            };
            hook(system.as_mut(), self);
            self.restore_system(id, system);
        }
    }

    fn notify(&mut self, hook: impl FnMut(&mut dyn System, &mut Self)) {
        if self.systems.is_empty() {
            return;
        }
        let ids = self.system_snapshot();
        self.run_systems(&ids, hook);
    }

    // ==================== Entity Operations ====================

    /// Add the smallest free entity id.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let index = self
            .entities
            .next()
            .ok_or_else(|| self.capacity_exceeded(Pool::Entities))?;
        let entity = Entity::from_index(index);
        self.add_entity(entity)?;
        Ok(entity)
    }

    /// Add a specific entity id.
    pub fn add_entity(&mut self, entity: Entity) -> EcsResult<()> {
        if entity.index() >= self.entities.capacity() {
            return Err(self.capacity_exceeded(Pool::Entities));
        }
        if self.entities.has(entity.index()) {
            return Err(EcsError::EntityExists(entity));
        }

        self.notify(|system, manager| system.manager_will_add_entity(manager, entity));
        self.entities.add(entity.index());
        trace!(%entity, "entity added");
        self.notify(|system, manager| system.manager_did_add_entity(manager, entity));
        Ok(())
    }

    /// Delete an entity after deleting its components and detaching its tags.
    pub fn delete_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.require_entity(entity)?;

        self.notify(|system, manager| system.manager_will_delete_entity(manager, entity));

        let owned: SmallVec<[ComponentId; 16]> = self
            .index
            .types_of_entity(entity)
            .filter_map(|ty| self.index.get(entity, ty))
            .collect();
        for component in owned {
            self.delete_component_by_identifier(component)?;
        }

        let tags: SmallVec<[Tag; 8]> = self.relations.tags_of_entity(entity).collect();
        for tag in tags {
            self.detach_tag_from_entity(tag, entity)?;
        }
        let stale = self.relations.detach_all(entity);
        debug_assert!(stale.is_empty(), "tags left on deleted entity: {stale:?}");

        self.entities.delete(entity.index());
        trace!(%entity, "entity deleted");

        self.notify(|system, manager| system.manager_did_delete_entity(manager, entity));
        Ok(())
    }

    #[must_use]
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.entities.has(entity.index())
    }

    /// Live entities, in unspecified order.
    pub fn entities(&self) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.entities.iter().map(Entity::from_index)
    }

    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ==================== Tag Operations ====================

    /// Add the smallest free tag id.
    pub fn create_tag(&mut self) -> EcsResult<Tag> {
        let index = self
            .tags
            .next()
            .ok_or_else(|| self.capacity_exceeded(Pool::Tags))?;
        let tag = Tag::from_index(index);
        self.add_tag(tag)?;
        Ok(tag)
    }

    /// Add a specific tag id.
    pub fn add_tag(&mut self, tag: Tag) -> EcsResult<()> {
        if tag.index() >= self.tags.capacity() {
            return Err(self.capacity_exceeded(Pool::Tags));
        }
        if self.tags.has(tag.index()) {
            return Err(EcsError::TagExists(tag));
        }

        self.notify(|system, manager| system.manager_will_add_tag(manager, tag));
        self.tags.add(tag.index());
        trace!(%tag, "tag added");
        self.notify(|system, manager| system.manager_did_add_tag(manager, tag));
        Ok(())
    }

    /// Delete a tag after detaching it from every entity.
    pub fn delete_tag(&mut self, tag: Tag) -> EcsResult<()> {
        self.require_tag(tag)?;

        self.notify(|system, manager| system.manager_will_delete_tag(manager, tag));

        let carriers: SmallVec<[Entity; 16]> = self.relations.entities_with_tag(tag).collect();
        for entity in carriers {
            self.detach_tag_from_entity(tag, entity)?;
        }
        let stale = self.relations.detach_from_its_entities(tag);
        debug_assert_eq!(stale, 0, "entities left on deleted tag");

        self.tags.delete(tag.index());
        trace!(%tag, "tag deleted");

        self.notify(|system, manager| system.manager_did_delete_tag(manager, tag));
        Ok(())
    }

    pub fn attach_tag_to_entity(&mut self, tag: Tag, entity: Entity) -> EcsResult<()> {
        self.require_tag(tag)?;
        self.require_entity(entity)?;
        if self.relations.has(tag, entity) {
            return Err(EcsError::TagAlreadyAttached { tag, entity });
        }

        self.notify(|system, manager| system.manager_will_attach_tag_to_entity(manager, tag, entity));
        self.relations.attach(tag, entity);
        trace!(%tag, %entity, "tag attached");
        self.notify(|system, manager| system.manager_did_attach_tag_to_entity(manager, tag, entity));
        Ok(())
    }

    pub fn detach_tag_from_entity(&mut self, tag: Tag, entity: Entity) -> EcsResult<()> {
        self.require_tag(tag)?;
        self.require_entity(entity)?;
        if !self.relations.has(tag, entity) {
            return Err(EcsError::TagNotAttached { tag, entity });
        }

        self.notify(|system, manager| {
            system.manager_will_detach_tag_from_entity(manager, tag, entity);
        });
        self.relations.detach(tag, entity);
        trace!(%tag, %entity, "tag detached");
        self.notify(|system, manager| {
            system.manager_did_detach_tag_from_entity(manager, tag, entity);
        });
        Ok(())
    }

    #[must_use]
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.has(tag.index())
    }

    #[must_use]
    pub fn entity_has_tag(&self, entity: Entity, tag: Tag) -> bool {
        self.relations.has(tag, entity)
    }

    /// Live tags, in unspecified order.
    pub fn tags(&self) -> impl ExactSizeIterator<Item = Tag> + '_ {
        self.tags.iter().map(Tag::from_index)
    }

    #[must_use]
    pub const fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn entities_with_tag(&self, tag: Tag) -> EcsResult<impl ExactSizeIterator<Item = Entity> + '_> {
        self.require_tag(tag)?;
        Ok(self.relations.entities_with_tag(tag))
    }

    /// Tags attached to `entity`. Scans every tag slot.
    pub fn tags_of_entity(&self, entity: Entity) -> EcsResult<impl Iterator<Item = Tag> + '_> {
        self.require_entity(entity)?;
        Ok(self.relations.tags_of_entity(entity))
    }

    // ==================== Type Operations ====================

    /// Register a descriptor under the smallest free handle.
    ///
    /// Fails with [`EcsError::DuplicateType`] if the descriptor is already
    /// registered; use [`ensure_type`](Self::ensure_type) for idempotent
    /// registration.
    pub fn add_type(&mut self, descriptor: Rc<dyn TypeDescriptor>) -> EcsResult<TypeHandle> {
        self.reject_registered(&descriptor)?;
        let ty = self
            .types
            .next_handle()
            .ok_or_else(|| self.capacity_exceeded(Pool::Types))?;
        self.add_type_at(ty, descriptor)?;
        Ok(ty)
    }

    /// Register a descriptor under a specific handle.
    pub fn add_type_at(&mut self, ty: TypeHandle, descriptor: Rc<dyn TypeDescriptor>) -> EcsResult<()> {
        if ty.index() >= self.types.capacity() {
            return Err(self.capacity_exceeded(Pool::Types));
        }
        if self.types.has(ty) {
            return Err(EcsError::TypeExists(ty));
        }
        self.reject_registered(&descriptor)?;

        self.notify(|system, manager| system.manager_will_add_type(manager, ty, descriptor.as_ref()));
        self.types.register_at(ty, Rc::clone(&descriptor));
        trace!(%ty, name = descriptor.name(), "type added");
        self.notify(|system, manager| system.manager_did_add_type(manager, ty, descriptor.as_ref()));
        Ok(())
    }

    /// Handle of `descriptor`, registering it first if needed.
    pub fn ensure_type(&mut self, descriptor: Rc<dyn TypeDescriptor>) -> EcsResult<TypeHandle> {
        match self.types.handle_of(&descriptor) {
            Some(ty) => Ok(ty),
            None => self.add_type(descriptor),
        }
    }

    fn reject_registered(&self, descriptor: &Rc<dyn TypeDescriptor>) -> EcsResult<()> {
        match self.types.handle_of(descriptor) {
            Some(existing) => Err(EcsError::DuplicateType {
                name: descriptor.name().to_owned(),
                existing,
            }),
            None => Ok(()),
        }
    }

    /// Delete a type after deleting every component of it.
    pub fn delete_type(&mut self, ty: TypeHandle) -> EcsResult<()> {
        self.require_type(ty)?;

        self.notify(|system, manager| system.manager_will_delete_type(manager, ty));

        let owned: SmallVec<[ComponentId; 16]> = self
            .index
            .entities_with_type(ty)
            .filter_map(|entity| self.index.get(entity, ty))
            .collect();
        for component in owned {
            self.delete_component_by_identifier(component)?;
        }

        let descriptor = self.types.unregister(ty);
        trace!(%ty, name = descriptor.as_ref().map(|d| d.name()), "type deleted");

        self.notify(|system, manager| system.manager_did_delete_type(manager, ty));
        Ok(())
    }

    #[must_use]
    pub fn has_type(&self, ty: TypeHandle) -> bool {
        self.types.has(ty)
    }

    /// Registered handles, in unspecified order.
    pub fn types(&self) -> impl ExactSizeIterator<Item = TypeHandle> + '_ {
        self.types.iter()
    }

    #[must_use]
    pub const fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn type_descriptor(&self, ty: TypeHandle) -> EcsResult<&Rc<dyn TypeDescriptor>> {
        self.types.get(ty).ok_or(EcsError::TypeNotFound(ty))
    }

    /// Handle of a registered descriptor.
    #[must_use]
    pub fn type_of(&self, descriptor: &Rc<dyn TypeDescriptor>) -> Option<TypeHandle> {
        self.types.handle_of(descriptor)
    }

    pub fn entities_with_type(&self, ty: TypeHandle) -> EcsResult<impl ExactSizeIterator<Item = Entity> + '_> {
        self.require_type(ty)?;
        Ok(self.index.entities_with_type(ty))
    }

    pub fn types_of_entity(&self, entity: Entity) -> EcsResult<impl ExactSizeIterator<Item = TypeHandle> + '_> {
        self.require_entity(entity)?;
        Ok(self.index.types_of_entity(entity))
    }

    // ==================== Component Operations ====================

    /// Create the component of type `ty` on `entity`.
    ///
    /// Checks run in order: entity exists, type exists, component pool has
    /// room, entity has no component of `ty` yet.
    pub fn create_component(&mut self, entity: Entity, ty: TypeHandle) -> EcsResult<ComponentId> {
        self.create_component_with(entity, ty, |_| {})
    }

    /// Like [`create_component`](Self::create_component), running `init` on
    /// the fresh component before the did-notification.
    pub fn create_component_with(
        &mut self,
        entity: Entity,
        ty: TypeHandle,
        init: impl FnOnce(&mut Component),
    ) -> EcsResult<ComponentId> {
        self.require_entity(entity)?;
        let descriptor = Rc::clone(self.type_descriptor(ty)?);
        let id = self
            .components
            .next_id()
            .ok_or_else(|| self.capacity_exceeded(Pool::Components))?;
        if self.index.has(entity, ty) {
            return Err(EcsError::DuplicateComponent { entity, ty });
        }

        self.notify(|system, manager| system.manager_will_add_component(manager, entity, ty, id));

        let created = self
            .components
            .create(entity, ty, &descriptor)
            .ok_or_else(|| self.capacity_exceeded(Pool::Components))?;
        debug_assert_eq!(created, id);
        self.index.set(entity, ty, created);
        if let Some(component) = self.components.get_mut(created) {
            init(component);
        }
        trace!(component = %created, %entity, %ty, "component added");

        self.notify(|system, manager| {
            system.manager_did_add_component(manager, entity, ty, created);
        });
        Ok(created)
    }

    /// Delete a component by its own id.
    pub fn delete_component_by_identifier(&mut self, id: ComponentId) -> EcsResult<()> {
        let component = self.component(id)?;
        let (entity, ty) = (component.entity(), component.ty());

        self.notify(|system, manager| {
            system.manager_will_delete_component(manager, entity, ty, id);
        });
        self.index.delete(entity, ty);
        self.components.delete(id);
        trace!(component = %id, %entity, %ty, "component deleted");
        self.notify(|system, manager| {
            system.manager_did_delete_component(manager, entity, ty, id);
        });
        Ok(())
    }

    /// Delete the component of type `ty` on `entity`.
    pub fn delete_component_of_entity(&mut self, entity: Entity, ty: TypeHandle) -> EcsResult<()> {
        let id = self.component_of_entity(entity, ty)?.id();
        self.delete_component_by_identifier(id)
    }

    #[must_use]
    pub fn has_component(&self, entity: Entity, ty: TypeHandle) -> bool {
        self.index.has(entity, ty)
    }

    pub fn component(&self, id: ComponentId) -> EcsResult<&Component> {
        self.components.get(id).ok_or(EcsError::ComponentNotFound(id))
    }

    pub fn component_mut(&mut self, id: ComponentId) -> EcsResult<&mut Component> {
        self.components
            .get_mut(id)
            .ok_or(EcsError::ComponentNotFound(id))
    }

    /// The component, only if it is of type `ty`.
    pub fn component_of_type(&self, id: ComponentId, ty: TypeHandle) -> EcsResult<&Component> {
        self.components
            .get_typed(id, ty)
            .ok_or(EcsError::ComponentNotFound(id))
    }

    pub fn component_of_entity(&self, entity: Entity, ty: TypeHandle) -> EcsResult<&Component> {
        let id = self.component_id_of_entity(entity, ty)?;
        self.component(id)
    }

    pub fn component_of_entity_mut(
        &mut self,
        entity: Entity,
        ty: TypeHandle,
    ) -> EcsResult<&mut Component> {
        let id = self.component_id_of_entity(entity, ty)?;
        self.component_mut(id)
    }

    fn component_id_of_entity(&self, entity: Entity, ty: TypeHandle) -> EcsResult<ComponentId> {
        self.require_entity(entity)?;
        self.require_type(ty)?;
        self.index
            .get(entity, ty)
            .ok_or(EcsError::MissingComponent { entity, ty })
    }

    /// Payload of the (`entity`, `ty`) component as `T`.
    pub fn component_data<T: 'static>(&self, entity: Entity, ty: TypeHandle) -> EcsResult<&T> {
        let component = self.component_of_entity(entity, ty)?;
        component.data::<T>().ok_or(EcsError::PayloadMismatch {
            component: component.id(),
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn component_data_mut<T: 'static>(
        &mut self,
        entity: Entity,
        ty: TypeHandle,
    ) -> EcsResult<&mut T> {
        let component = self.component_of_entity_mut(entity, ty)?;
        let id = component.id();
        component.data_mut::<T>().ok_or(EcsError::PayloadMismatch {
            component: id,
            expected: std::any::type_name::<T>(),
        })
    }

    /// Live components, in unspecified order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.components.iter()
    }

    #[must_use]
    pub const fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Deep copy of every live component, through each descriptor's `copy`.
    #[must_use]
    pub fn clone_components(&self) -> ComponentRepository {
        self.components.clone()
    }

    // ==================== System Operations ====================

    /// Register a system. It is attached and initialized before it starts
    /// receiving notifications.
    pub fn add_system(&mut self, system: impl System) -> SystemId {
        self.add_boxed_system(Box::new(system))
    }

    pub fn add_boxed_system(&mut self, mut system: Box<dyn System>) -> SystemId {
        let id = SystemId::new(self.next_system);
        self.next_system += 1;

        system.attach(self, id);
        system.initialize(self);
        debug!(system = %id, name = system.name(), "system added");

        self.systems.push(SystemSlot {
            id,
            system: Some(system),
        });
        id
    }

    /// Unregister a system, detach it, and hand it back.
    pub fn remove_system(&mut self, id: SystemId) -> EcsResult<Box<dyn System>> {
        let position = self
            .slot_position(id)
            .ok_or(EcsError::SystemNotFound(id))?;
        let mut system = self.systems[position]
            .system
            .take()
            .ok_or(EcsError::SystemInUse(id))?;
        self.systems.remove(position);

        system.detach();
        debug!(system = %id, name = system.name(), "system removed");
        Ok(system)
    }

    #[must_use]
    pub fn has_system(&self, id: SystemId) -> bool {
        self.slot_position(id).is_some()
    }

    /// The system, unless it is currently running.
    #[must_use]
    pub fn system(&self, id: SystemId) -> Option<&dyn System> {
        let position = self.slot_position(id)?;
        self.systems[position].system.as_deref()
    }

    /// Registered systems, in registration order.
    pub fn systems(&self) -> impl ExactSizeIterator<Item = SystemId> + '_ {
        self.systems.iter().map(|slot| slot.id)
    }

    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Advance every system by `delta`.
    ///
    /// Runs three passes in registration order: all `manager_will_update`,
    /// then all `update`, then all `manager_did_update`. Systems added during
    /// the call join from the next `update`.
    pub fn update(&mut self, delta: f64) {
        let ids = self.system_snapshot();
        debug!(delta, systems = ids.len(), "update");

        self.run_systems(&ids, |system, manager| system.manager_will_update(manager, delta));
        self.run_systems(&ids, |system, manager| system.update(manager, delta));
        self.run_systems(&ids, |system, manager| system.manager_did_update(manager, delta));
    }

    // ==================== Capacity ====================

    /// Resize every pool.
    ///
    /// Fires no notifications. Anything whose id does not fit the new
    /// capacity is dropped, and so is every component whose entity or type
    /// is dropped.
    pub fn reallocate(&mut self, capacities: Capacities) -> EcsResult<()> {
        capacities.validate()?;

        let doomed: Vec<ComponentId> = self
            .components
            .iter()
            .filter(|component| {
                component.id().index() >= capacities.components
                    || component.entity().index() >= capacities.entities
                    || component.ty().index() >= capacities.types
            })
            .map(Component::id)
            .collect();
        for &id in &doomed {
            if let Some(component) = self.components.delete(id) {
                self.index.delete(component.entity(), component.ty());
            }
        }

        let dropped_entities = self.entities.reallocate(capacities.entities);
        let dropped_tags = self.tags.reallocate(capacities.tags);
        let dropped_types = self.types.reallocate(capacities.types).len();
        self.index.reallocate(capacities.entities, capacities.types);
        self.relations.reallocate(capacities.entities, capacities.tags);
        self.components.reallocate(capacities.components);

        let previous = std::mem::replace(&mut self.capacities, capacities);
        info!(?previous, current = ?capacities, "reallocated");
        if dropped_entities + dropped_tags + dropped_types + doomed.len() > 0 {
            warn!(
                entities = dropped_entities,
                tags = dropped_tags,
                types = dropped_types,
                components = doomed.len(),
                "reallocation dropped live elements"
            );
        }
        Ok(())
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        for slot in &mut self.systems {
            if let Some(system) = slot.system.as_mut() {
                system.destroy();
            }
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("capacities", &self.capacities)
            .field("entities", &self.entities.len())
            .field("tags", &self.tags.len())
            .field("types", &self.types)
            .field("components", &self.components.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}
