//! # Brisk Physics
//!
//! Collision detection for the Brisk engine.
//!
//! ## Features
//! - Spatial hash broad phase with a cell size that adapts to object sizes
//! - Exact rectangle overlap as the narrow phase
//! - 2D transform and collider components
//! - A collision system that keeps the broad phase in sync with the ECS

pub mod collision;
pub mod spatial_hash;

use brisk_core::ecs::EcsError;
use brisk_core::{Entity, Rect2};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use collision::{CollisionSystem, Contacts};
pub use spatial_hash::{
    CellHash, CollisionResult, SpatialHashConfig, SpatialHashHandle, SpatialHashMap, spatial_hash,
};

/// Physics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Entity {entity} overlaps more than {max} entities")]
    CollisionLimitReached { entity: Entity, max: usize },

    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),
}

/// Result type for physics operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Position and scale of an entity in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Transform2D {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Unscaled transform at `position`
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::ONE,
        }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned collision box, relative to the entity's transform
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Collider2D {
    pub rect: Rect2,
}

impl Collider2D {
    pub fn new(rect: Rect2) -> Self {
        Self { rect }
    }

    /// Collision box in world space
    pub fn world_rect(&self, transform: &Transform2D) -> Rect2 {
        Rect2::new(
            transform.position.x + self.rect.x * transform.scale.x,
            transform.position.y + self.rect.y * transform.scale.y,
            self.rect.w * transform.scale.x,
            self.rect.h * transform.scale.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collider_world_rect() {
        let collider = Collider2D::new(Rect2::new(-4.0, -4.0, 8.0, 8.0));
        let transform = Transform2D {
            position: Vec2::new(100.0, 50.0),
            scale: Vec2::new(2.0, 0.5),
        };
        assert_eq!(collider.world_rect(&transform), Rect2::new(92.0, 48.0, 16.0, 4.0));
        assert_eq!(
            collider.world_rect(&Transform2D::default()),
            Rect2::new(-4.0, -4.0, 8.0, 8.0)
        );
    }

    #[test]
    fn test_error_messages() {
        let err = PhysicsError::CollisionLimitReached {
            entity: Entity::from_raw(3),
            max: 16,
        };
        assert_eq!(err.to_string(), "Entity 3 overlaps more than 16 entities");
    }
}
