#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::float_cmp)]

//! Matrix ECS - fixed-capacity Entity Component System registry
//!
//! Every pool is preallocated and identifiers are small dense integers, so
//! membership tests, insertions and deletions are O(1).
//!
//! # Key Concepts
//!
//! - **Entity**: An identifier with no data of its own
//! - **Tag**: A boolean marker attached to any number of entities
//! - **Type**: A registered [`TypeDescriptor`] that builds component payloads
//! - **Component**: The payload owned by one (entity, type) pair
//! - **System**: An observer notified before and after every mutation
//!
//! # Mutation Protocol
//!
//! Every [`Manager`] mutation validates first, then broadcasts a *will*
//! notification, applies the change, and broadcasts a *did* notification:
//! ```ignore
//! let mut manager = Manager::builder().entities(64).build()?;
//! let position = manager.add_type(DefaultType::<Position>::shared())?;
//!
//! let entity = manager.create_entity()?;
//! manager.create_component(entity, position)?;
//! manager.component_data_mut::<Position>(entity, position)?.x = 1.0;
//!
//! // Deletes the component first, with its own will/did pair
//! manager.delete_entity(entity)?;
//! ```

mod config;
mod entity;
mod error;
mod identifier;
mod index;
mod manager;
mod registry;
mod repository;
mod system;
mod tags;

pub use config::{Capacities, ManagerBuilder};
pub use entity::{ComponentId, Entity, SystemId, Tag, TypeHandle};
pub use error::{EcsError, EcsResult, ErrorKind, Pool};
pub use identifier::{IdentifierAllocator, Iter};
pub use index::ComponentIndex;
pub use manager::Manager;
pub use registry::{DefaultType, Payload, TypeDescriptor, TypeRegistry};
pub use repository::{Component, ComponentRepository};
pub use system::System;
pub use tags::TagRelations;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Component, ComponentId, DefaultType, EcsError, EcsResult, Entity, Manager, System, Tag,
        TypeDescriptor, TypeHandle,
    };
}
