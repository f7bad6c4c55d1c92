//! Manager error types.

use std::fmt;

use thiserror::Error;

use crate::entity::{ComponentId, Entity, SystemId, Tag, TypeHandle};

/// One of the four fixed-capacity pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Entities,
    Tags,
    Types,
    Components,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entities => "entities",
            Self::Tags => "tags",
            Self::Types => "types",
            Self::Components => "components",
        })
    }
}

/// Coarse classification of an [`EcsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced entity, tag, type, component or system does not exist.
    NotFound,
    /// The id, descriptor or relation is already present.
    AlreadyExists,
    /// The pool is full; `reallocate` before retrying.
    CapacityExceeded,
    /// Both ends exist but the relation is not in the required state.
    InvalidRelation,
    /// A construction or reallocation parameter is out of range.
    InvalidArgument,
}

/// Manager error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity not found: {0}")]
    EntityNotFound(Entity),

    #[error("tag not found: {0}")]
    TagNotFound(Tag),

    #[error("type not found: {0}")]
    TypeNotFound(TypeHandle),

    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// The entity exists but holds no component of the type.
    #[error("entity {entity} has no component of type {ty}")]
    MissingComponent { entity: Entity, ty: TypeHandle },

    #[error("system not found: {0}")]
    SystemNotFound(SystemId),

    #[error("entity already exists: {0}")]
    EntityExists(Entity),

    #[error("tag already exists: {0}")]
    TagExists(Tag),

    #[error("type handle already in use: {0}")]
    TypeExists(TypeHandle),

    /// The descriptor is already registered under another handle.
    #[error("type descriptor `{name}` is already registered as {existing}")]
    DuplicateType { name: String, existing: TypeHandle },

    #[error("tag {tag} is already attached to entity {entity}")]
    TagAlreadyAttached { tag: Tag, entity: Entity },

    #[error("entity {entity} already has a component of type {ty}")]
    DuplicateComponent { entity: Entity, ty: TypeHandle },

    #[error("{pool} capacity of {capacity} exceeded")]
    CapacityExceeded { pool: Pool, capacity: usize },

    #[error("tag {tag} is not attached to entity {entity}")]
    TagNotAttached { tag: Tag, entity: Entity },

    /// The component payload is not of the requested Rust type.
    #[error("component {component} payload is not a `{expected}`")]
    PayloadMismatch {
        component: ComponentId,
        expected: &'static str,
    },

    /// A system tried to remove itself from inside its own `update`.
    #[error("system {0} is running and cannot be removed")]
    SystemInUse(SystemId),

    #[error("invalid {pool} capacity: {requested}")]
    InvalidCapacity { pool: Pool, requested: usize },
}

impl EcsError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EntityNotFound(_)
            | Self::TagNotFound(_)
            | Self::TypeNotFound(_)
            | Self::ComponentNotFound(_)
            | Self::MissingComponent { .. }
            | Self::SystemNotFound(_) => ErrorKind::NotFound,
            Self::EntityExists(_)
            | Self::TagExists(_)
            | Self::TypeExists(_)
            | Self::DuplicateType { .. }
            | Self::TagAlreadyAttached { .. }
            | Self::DuplicateComponent { .. } => ErrorKind::AlreadyExists,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::TagNotAttached { .. } | Self::PayloadMismatch { .. } | Self::SystemInUse(_) => {
                ErrorKind::InvalidRelation
            }
            Self::InvalidCapacity { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// Result type for manager operations.
pub type EcsResult<T> = Result<T, EcsError>;
