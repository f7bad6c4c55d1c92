//! Plain integer handles.
//!
//! Every handle is a `u32` newtype. Handles carry no generation: existence
//! is decided by membership in the owning [`Manager`](crate::Manager) pool,
//! and freed ids are reused by the next allocation.

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a raw value.
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw handle value.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the handle as a slot index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            // Pool capacities are capped at `u32::MAX`, so every slot fits.
            pub(crate) const fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle!(
    /// A thing that may own components and carry tags.
    Entity,
    "Entity"
);

handle!(
    /// A boolean label attachable to any number of entities.
    Tag,
    "Tag"
);

handle!(
    /// Dense id assigned to a registered [`TypeDescriptor`](crate::TypeDescriptor).
    TypeHandle,
    "TypeHandle"
);

handle!(
    /// Identifier of a component instance, independent of its entity and type.
    ComponentId,
    "ComponentId"
);

handle!(
    /// Identifier of a system registered with a manager.
    SystemId,
    "SystemId"
);
