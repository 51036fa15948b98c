//! Entity identifiers and the recycling allocator.

use std::collections::VecDeque;
use std::fmt;

use super::{EcsError, EcsResult};
use crate::config::EcsConfig;

/// Opaque entity identifier
///
/// An entity has no data of its own; what it is depends entirely on the
/// components attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u32);

impl Entity {
    /// Invalid entity reference
    pub const NULL: Self = Self(u32::MAX);

    /// Wrap a raw id
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Get the id as an index into dense per-entity arrays
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Check if this is the null entity
    pub fn is_null(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out entity ids from a FIFO queue of free ids.
///
/// The queue starts with a block of sequential ids. Destroyed ids go to the
/// back of the queue, so memory indexed by entity id stays bounded by
/// `max_entities` rather than by the number of entities ever created.
#[derive(Debug)]
pub struct EntityAllocator {
    free: VecDeque<Entity>,
    /// Next id that has never been handed out or queued
    next_id: u32,
    max_entities: u32,
    alive: Vec<bool>,
    active: usize,
}

impl EntityAllocator {
    /// Create an allocator seeded with `initial_entity_pool` ids
    pub fn new(config: &EcsConfig) -> Self {
        let seed = config.initial_entity_pool.min(config.max_entities);
        Self {
            free: (0..seed).map(Entity).collect(),
            next_id: seed,
            max_entities: config.max_entities,
            alive: Vec::with_capacity(seed as usize),
            active: 0,
        }
    }

    /// Allocate an entity id
    pub fn create(&mut self) -> EcsResult<Entity> {
        if self.free.is_empty() {
            if self.next_id >= self.max_entities {
                return Err(EcsError::EntityLimitReached {
                    max: self.max_entities,
                });
            }
            self.free.push_back(Entity(self.next_id));
            self.next_id += 1;
        }

        let Some(entity) = self.free.pop_front() else {
            return Err(EcsError::EntityLimitReached {
                max: self.max_entities,
            });
        };

        let index = entity.index();
        if self.alive.len() <= index {
            self.alive.resize(index + 1, false);
        }
        self.alive[index] = true;
        self.active += 1;

        Ok(entity)
    }

    /// Return an entity id to the free queue.
    ///
    /// Components and system memberships are not touched. Returns `false` if
    /// the entity was not live.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            log::warn!("Attempted to destroy entity {} which is not alive", entity);
            return false;
        }

        self.alive[entity.index()] = false;
        self.active -= 1;
        self.free.push_back(entity);
        true
    }

    /// Check if an entity id is currently handed out
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Number of live entities (created minus destroyed)
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Configured entity cap
    pub fn max_entities(&self) -> u32 {
        self.max_entities
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new(&EcsConfig::default())
    }
}
