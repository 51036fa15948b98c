//! Collision system
//!
//! Tracks every entity with a [`Transform2D`] and a [`Collider2D`] in a
//! [`SpatialHashMap`], refreshes their rectangles each fixed update and records
//! the overlapping pairs.

use std::cell::RefCell;
use std::rc::Rc;

use brisk_core::ecs::ComponentStore;
use brisk_core::{Entity, Rect2, Signature, System, SystemContext, SystemHooks, SystemId, World};

use crate::spatial_hash::{SpatialHashConfig, SpatialHashMap};
use crate::{Collider2D, PhysicsResult, Transform2D};

/// Overlapping pairs found by the last fixed update.
///
/// Cloning shares the same list, so game code can keep a handle after the
/// system has been moved into the world.
#[derive(Debug, Clone, Default)]
pub struct Contacts {
    pairs: Rc<RefCell<Vec<(Entity, Entity)>>>,
}

impl Contacts {
    /// Every pair, lower entity id first
    pub fn pairs(&self) -> Vec<(Entity, Entity)> {
        self.pairs.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.pairs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.borrow().is_empty()
    }

    /// Check if two entities were touching, in either order
    pub fn contains(&self, a: Entity, b: Entity) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.pairs.borrow().contains(&key)
    }

    /// Entities touching `entity`
    pub fn involving(&self, entity: Entity) -> Vec<Entity> {
        self.pairs
            .borrow()
            .iter()
            .filter_map(|&(a, b)| {
                if a == entity {
                    Some(b)
                } else if b == entity {
                    Some(a)
                } else {
                    None
                }
            })
            .collect()
    }
}

fn world_rect(components: &ComponentStore, entity: Entity) -> Option<Rect2> {
    let transform = components.find_component::<Transform2D>(entity)?;
    let collider = components.find_component::<Collider2D>(entity)?;
    Some(collider.world_rect(transform))
}

/// Broad and narrow phase collision over [`Transform2D`] + [`Collider2D`] entities
pub struct CollisionSystem {
    spatial_hash: SpatialHashMap,
    contacts: Contacts,
}

impl CollisionSystem {
    pub fn new(config: &SpatialHashConfig) -> Self {
        Self {
            spatial_hash: SpatialHashMap::new(config),
            contacts: Contacts::default(),
        }
    }

    /// Handle to the contact list
    pub fn contacts(&self) -> Contacts {
        self.contacts.clone()
    }

    /// The broad phase index
    pub fn spatial_hash(&self) -> &SpatialHashMap {
        &self.spatial_hash
    }

    /// Register the collider components and a collision system in `world`
    pub fn register(world: &mut World, config: &SpatialHashConfig) -> PhysicsResult<(SystemId, Contacts)> {
        let transform = world.register_component::<Transform2D>()?;
        let collider = world.register_component::<Collider2D>()?;
        let signature: Signature = transform.flag() | collider.flag();

        let system = Self::new(config);
        let contacts = system.contacts();
        let id = world.register_system(signature, system)?;
        Ok((id, contacts))
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &str {
        "collision"
    }

    fn hooks(&self) -> SystemHooks {
        SystemHooks::FIXED_UPDATE
    }

    fn on_entity_registered(&mut self, ctx: &mut SystemContext<'_>, entity: Entity) {
        if let Some(rect) = world_rect(ctx.components, entity) {
            self.spatial_hash.insert_or_update(entity, rect);
        }
    }

    fn on_entity_unregistered(&mut self, _ctx: &mut SystemContext<'_>, entity: Entity) {
        self.spatial_hash.remove(entity);
    }

    fn fixed_update(&mut self, ctx: &mut SystemContext<'_>, _delta_time: f32) {
        for &entity in ctx.entities {
            if let Some(rect) = world_rect(ctx.components, entity) {
                self.spatial_hash.insert_or_update(entity, rect);
            }
        }

        let mut pairs = self.contacts.pairs.borrow_mut();
        pairs.clear();
        for &entity in ctx.entities {
            match self.spatial_hash.compute_collision(entity) {
                Ok(result) => pairs.extend(
                    result
                        .entities()
                        .iter()
                        .filter(|&&other| entity < other)
                        .map(|&other| (entity, other)),
                ),
                Err(err) => log::error!("Collision query failed: {}", err),
            }
        }
    }
}
