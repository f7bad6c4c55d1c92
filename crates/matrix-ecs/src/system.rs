//! Observers of manager mutations.
//!
//! A [`System`] is moved into a [`Manager`] with
//! [`add_system`](Manager::add_system) and receives a will/did hook pair
//! around every mutation, in registration order.
//!
//! Notification hooks get `&Manager`: they can read the registry but cannot
//! mutate it, so a hook never re-enters the manager mid-mutation. Only
//! [`System::update`] gets `&mut Manager`; mutations it performs are
//! broadcast to every other system (the running system is not notified of
//! its own changes).

use crate::{
    entity::{ComponentId, Entity, SystemId, Tag, TypeHandle},
    manager::Manager,
    registry::TypeDescriptor,
};

/// Lifecycle hooks and per-frame logic. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait System: 'static {
    /// Name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    // ==================== Lifecycle ====================

    /// Called when the system is added, before [`initialize`](Self::initialize).
    fn attach(&mut self, manager: &Manager, id: SystemId) {}

    fn initialize(&mut self, manager: &Manager) {}

    /// Called when the system is removed from its manager.
    fn detach(&mut self) {}

    /// Called when the owning manager is dropped.
    fn destroy(&mut self) {}

    // ==================== Update ====================

    fn manager_will_update(&mut self, manager: &Manager, delta: f64) {}

    /// Per-frame logic. Mutations made here are broadcast to every other
    /// system; this system's own hooks do not fire for them.
    fn update(&mut self, manager: &mut Manager, delta: f64) {}

    fn manager_did_update(&mut self, manager: &Manager, delta: f64) {}

    // ==================== Entities ====================

    fn manager_will_add_entity(&mut self, manager: &Manager, entity: Entity) {}

    fn manager_did_add_entity(&mut self, manager: &Manager, entity: Entity) {}

    fn manager_will_delete_entity(&mut self, manager: &Manager, entity: Entity) {}

    fn manager_did_delete_entity(&mut self, manager: &Manager, entity: Entity) {}

    // ==================== Tags ====================

    fn manager_will_add_tag(&mut self, manager: &Manager, tag: Tag) {}

    fn manager_did_add_tag(&mut self, manager: &Manager, tag: Tag) {}

    fn manager_will_delete_tag(&mut self, manager: &Manager, tag: Tag) {}

    fn manager_did_delete_tag(&mut self, manager: &Manager, tag: Tag) {}

    fn manager_will_attach_tag_to_entity(&mut self, manager: &Manager, tag: Tag, entity: Entity) {}

    fn manager_did_attach_tag_to_entity(&mut self, manager: &Manager, tag: Tag, entity: Entity) {}

    fn manager_will_detach_tag_from_entity(&mut self, manager: &Manager, tag: Tag, entity: Entity) {}

    fn manager_did_detach_tag_from_entity(&mut self, manager: &Manager, tag: Tag, entity: Entity) {}

    // ==================== Types ====================

    fn manager_will_add_type(
        &mut self,
        manager: &Manager,
        ty: TypeHandle,
        descriptor: &dyn TypeDescriptor,
    ) {
    }

    fn manager_did_add_type(
        &mut self,
        manager: &Manager,
        ty: TypeHandle,
        descriptor: &dyn TypeDescriptor,
    ) {
    }

    fn manager_will_delete_type(&mut self, manager: &Manager, ty: TypeHandle) {}

    fn manager_did_delete_type(&mut self, manager: &Manager, ty: TypeHandle) {}

    // ==================== Components ====================

    fn manager_will_add_component(
        &mut self,
        manager: &Manager,
        entity: Entity,
        ty: TypeHandle,
        component: ComponentId,
    ) {
    }

    fn manager_did_add_component(
        &mut self,
        manager: &Manager,
        entity: Entity,
        ty: TypeHandle,
        component: ComponentId,
    ) {
    }

    fn manager_will_delete_component(
        &mut self,
        manager: &Manager,
        entity: Entity,
        ty: TypeHandle,
        component: ComponentId,
    ) {
    }

    fn manager_did_delete_component(
        &mut self,
        manager: &Manager,
        entity: Entity,
        ty: TypeHandle,
        component: ComponentId,
    ) {
    }
}
