//! Type descriptors and their registry.
//!
//! A [`TypeDescriptor`] is the capability object that knows how to build,
//! copy and reset one kind of component payload. The [`TypeRegistry`] gives
//! each registered descriptor a dense [`TypeHandle`] and maps back from the
//! descriptor to its handle.
//!
//! Descriptors are deduplicated by identity: two `Rc`s pointing at the same
//! allocation are the same type, two separately allocated descriptors are
//! different types even if they describe the same Rust type.

use std::{any::Any, fmt, marker::PhantomData, rc::Rc};

use hashbrown::HashMap;

use crate::{
    entity::{ComponentId, Entity, TypeHandle},
    identifier::IdentifierAllocator,
};

/// Opaque component payload.
pub type Payload = Box<dyn Any>;

/// Capability interface for one kind of component payload.
pub trait TypeDescriptor {
    /// Name for logs and error messages.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Build the payload of a new component.
    fn instantiate(&self, entity: Entity, id: ComponentId) -> Payload;

    /// Copy the value of `origin` into `target`.
    fn copy(&self, origin: &dyn Any, target: &mut dyn Any);

    /// Reset `instance` to its freshly instantiated state.
    fn clear(&self, instance: &mut dyn Any);
}

/// Descriptor for any `T: Default + Clone`.
///
/// `instantiate` yields `T::default()`, `copy` uses `Clone::clone_from`,
/// `clear` writes `T::default()` back.
pub struct DefaultType<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Default + Clone + 'static> DefaultType<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// A fresh shared descriptor, ready for registration.
    #[must_use]
    pub fn shared() -> Rc<dyn TypeDescriptor> {
        Rc::new(Self::new())
    }
}

impl<T: Default + Clone + 'static> Default for DefaultType<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Clone + 'static> TypeDescriptor for DefaultType<T> {
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn instantiate(&self, _entity: Entity, _id: ComponentId) -> Payload {
        Box::new(T::default())
    }

    fn copy(&self, origin: &dyn Any, target: &mut dyn Any) {
        if let (Some(origin), Some(target)) = (origin.downcast_ref::<T>(), target.downcast_mut::<T>())
        {
            target.clone_from(origin);
        }
    }

    fn clear(&self, instance: &mut dyn Any) {
        if let Some(instance) = instance.downcast_mut::<T>() {
            *instance = T::default();
        }
    }
}

impl<T> fmt::Debug for DefaultType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultType<{}>", std::any::type_name::<T>())
    }
}

/// Thin address of the descriptor allocation.
fn identity(descriptor: &Rc<dyn TypeDescriptor>) -> usize {
    Rc::as_ptr(descriptor).cast::<()>() as usize
}

/// Bidirectional map between descriptors and type handles.
pub struct TypeRegistry {
    handles: IdentifierAllocator,
    /// Descriptor per handle slot.
    descriptors: Vec<Option<Rc<dyn TypeDescriptor>>>,
    /// Descriptor identity -> handle.
    by_identity: HashMap<usize, TypeHandle>,
}

impl TypeRegistry {
    /// Create an empty registry with room for `capacity` types.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            handles: IdentifierAllocator::new(capacity),
            descriptors: vec![None; capacity],
            by_identity: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.handles.capacity()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.handles.is_full()
    }

    /// Register a descriptor and return its handle.
    ///
    /// Registering the same descriptor again returns the existing handle.
    /// Returns `None` when every handle is taken.
    pub fn register(&mut self, descriptor: Rc<dyn TypeDescriptor>) -> Option<TypeHandle> {
        if let Some(handle) = self.handle_of(&descriptor) {
            return Some(handle);
        }
        let handle = self.next_handle()?;
        self.register_at(handle, descriptor).then_some(handle)
    }

    /// Register a descriptor under a chosen handle.
    ///
    /// Returns `false` if the handle is out of range or taken, or the
    /// descriptor is already registered.
    pub fn register_at(&mut self, handle: TypeHandle, descriptor: Rc<dyn TypeDescriptor>) -> bool {
        if self.handles.has(handle.index()) || self.handle_of(&descriptor).is_some() {
            return false;
        }
        if !self.handles.add(handle.index()) {
            return false;
        }
        self.by_identity.insert(identity(&descriptor), handle);
        self.descriptors[handle.index()] = Some(descriptor);
        true
    }

    /// Smallest unused handle, without reserving it.
    pub fn next_handle(&mut self) -> Option<TypeHandle> {
        self.handles.next().map(TypeHandle::from_index)
    }

    /// Remove a handle, returning its descriptor.
    pub fn unregister(&mut self, handle: TypeHandle) -> Option<Rc<dyn TypeDescriptor>> {
        if !self.handles.delete(handle.index()) {
            return None;
        }
        let descriptor = self.descriptors[handle.index()].take()?;
        self.by_identity.remove(&identity(&descriptor));
        Some(descriptor)
    }

    /// Remove a descriptor, returning the handle it held.
    pub fn unregister_descriptor(
        &mut self,
        descriptor: &Rc<dyn TypeDescriptor>,
    ) -> Option<TypeHandle> {
        let handle = self.handle_of(descriptor)?;
        self.unregister(handle).map(|_| handle)
    }

    #[must_use]
    pub fn has(&self, handle: TypeHandle) -> bool {
        self.handles.has(handle.index())
    }

    /// Descriptor registered under `handle`.
    #[must_use]
    pub fn get(&self, handle: TypeHandle) -> Option<&Rc<dyn TypeDescriptor>> {
        if !self.has(handle) {
            return None;
        }
        self.descriptors[handle.index()].as_ref()
    }

    /// Handle of a registered descriptor.
    #[must_use]
    pub fn handle_of(&self, descriptor: &Rc<dyn TypeDescriptor>) -> Option<TypeHandle> {
        self.by_identity.get(&identity(descriptor)).copied()
    }

    /// Iterate over registered handles.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = TypeHandle> + '_ {
        self.handles.iter().map(TypeHandle::from_index)
    }

    /// Resize to `capacity`, dropping every handle at or above it.
    ///
    /// Returns the dropped handles.
    pub fn reallocate(&mut self, capacity: usize) -> Vec<TypeHandle> {
        let dropped: Vec<TypeHandle> = self
            .iter()
            .filter(|handle| handle.index() >= capacity)
            .collect();
        for &handle in &dropped {
            self.unregister(handle);
        }

        self.handles.reallocate(capacity);
        self.descriptors.resize(capacity, None);
        dropped
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .filter_map(|handle| Some((handle, self.get(handle)?.name()))),
            )
            .finish()
    }
}
