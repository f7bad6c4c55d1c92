//! Pool capacities and the manager builder.

use serde::{Deserialize, Serialize};

use crate::{
    error::{EcsError, EcsResult, Pool},
    manager::Manager,
};

/// Fixed capacities of the four pools.
///
/// Missing fields deserialize to their defaults, so a host config file only
/// needs to name the pools it wants to change:
///
/// ```ignore
/// let capacities: Capacities = serde_json::from_str(r#"{ "entities": 4096 }"#)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Capacities {
    pub entities: usize,
    pub tags: usize,
    pub types: usize,
    pub components: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            entities: Self::DEFAULT_ENTITIES,
            tags: Self::DEFAULT_TAGS,
            types: Self::DEFAULT_TYPES,
            components: Self::DEFAULT_COMPONENTS,
        }
    }
}

impl Capacities {
    pub const DEFAULT_ENTITIES: usize = 1024;
    pub const DEFAULT_TAGS: usize = 16;
    pub const DEFAULT_TYPES: usize = 256;
    pub const DEFAULT_COMPONENTS: usize = 4096;

    /// Largest capacity any pool accepts; handles are `u32`.
    pub const MAX: usize = u32::MAX as usize;

    /// Capacity of a single pool.
    #[must_use]
    pub const fn get(&self, pool: Pool) -> usize {
        match pool {
            Pool::Entities => self.entities,
            Pool::Tags => self.tags,
            Pool::Types => self.types,
            Pool::Components => self.components,
        }
    }

    /// Reject zero and oversized capacities.
    pub fn validate(&self) -> EcsResult<()> {
        for pool in [Pool::Entities, Pool::Tags, Pool::Types, Pool::Components] {
            let requested = self.get(pool);
            if requested == 0 || requested > Self::MAX {
                return Err(EcsError::InvalidCapacity { pool, requested });
            }
        }
        Ok(())
    }
}

/// Builder for a [`Manager`].
///
/// ```ignore
/// let manager = Manager::builder().entities(64).tags(4).build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManagerBuilder {
    capacities: Capacities,
}

impl ManagerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn entities(mut self, capacity: usize) -> Self {
        self.capacities.entities = capacity;
        self
    }

    #[must_use]
    pub const fn tags(mut self, capacity: usize) -> Self {
        self.capacities.tags = capacity;
        self
    }

    #[must_use]
    pub const fn types(mut self, capacity: usize) -> Self {
        self.capacities.types = capacity;
        self
    }

    #[must_use]
    pub const fn components(mut self, capacity: usize) -> Self {
        self.capacities.components = capacity;
        self
    }

    /// Replace every capacity at once.
    #[must_use]
    pub const fn capacities(mut self, capacities: Capacities) -> Self {
        self.capacities = capacities;
        self
    }

    /// Build the manager, rejecting invalid capacities.
    pub fn build(self) -> EcsResult<Manager> {
        Manager::new(self.capacities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_baseline() {
        let capacities = Capacities::default();
        assert_eq!(capacities.entities, 1024);
        assert_eq!(capacities.tags, 16);
        assert_eq!(capacities.types, 256);
        assert_eq!(capacities.components, 4096);
        assert!(capacities.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let capacities = Capacities {
            tags: 0,
            ..Capacities::default()
        };
        assert_eq!(
            capacities.validate(),
            Err(EcsError::InvalidCapacity {
                pool: Pool::Tags,
                requested: 0,
            })
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let capacities: Capacities =
            serde_json::from_str(r#"{ "entities": 8, "components": 32 }"#).unwrap();

        assert_eq!(capacities.entities, 8);
        assert_eq!(capacities.components, 32);
        assert_eq!(capacities.tags, Capacities::DEFAULT_TAGS);
        assert_eq!(capacities.types, Capacities::DEFAULT_TYPES);
    }

    #[test]
    fn test_builder_sets_each_pool() {
        let manager = ManagerBuilder::new()
            .entities(2)
            .tags(3)
            .types(4)
            .components(5)
            .build()
            .unwrap();

        assert_eq!(
            manager.capacities(),
            Capacities {
                entities: 2,
                tags: 3,
                types: 4,
                components: 5,
            }
        );
    }

    #[test]
    fn test_builder_rejects_zero() {
        let err = ManagerBuilder::new().types(0).build().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }
}
