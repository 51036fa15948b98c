//! # Brisk Core
//!
//! Core runtime library for the Brisk 2D game engine.
//!
//! This crate provides the foundational systems the rest of the engine builds on:
//! - **ECS**: Recycled entity ids, bitset component signatures, systems with per-hook dispatch
//! - **Math**: 2D rectangles and the overlap test used by collision
//! - **Time**: Variable frame step and fixed-step simulation support
//! - **Config**: Engine limits, loadable from JSON

pub mod config;
pub mod ecs;
pub mod math;
pub mod time;

pub use config::{ConfigError, ConfigResult, EcsConfig, EngineConfig};
pub use ecs::{
    Component, EcsError, EcsResult, Entity, Signature, System, SystemContext, SystemHooks,
    SystemId, World,
};
pub use math::{Rect2, Vec2, rectangles_overlap};
pub use time::{FixedTimeStep, TimeManager};

/// Core engine instance
pub struct Engine {
    config: EngineConfig,
    world: World,
    time_manager: TimeManager,
}

impl Engine {
    /// Create a new engine instance with the given configuration.
    ///
    /// The configuration is validated first, so a non-positive fixed timestep
    /// or a zero limit is rejected here instead of stalling the frame loop.
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: EngineConfig) -> Self {
        let fixed = FixedTimeStep {
            step: config.fixed_timestep,
            max_updates: config.max_fixed_updates,
        };

        Self {
            world: World::new(config.ecs.clone()),
            time_manager: TimeManager::new(fixed),
            config,
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get mutable access to the ECS world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get the ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get the time manager
    pub fn time_manager(&self) -> &TimeManager {
        &self.time_manager
    }

    /// Get mutable access to the time manager
    pub fn time_manager_mut(&mut self) -> &mut TimeManager {
        &mut self.time_manager
    }

    /// Update the engine for one frame
    pub fn update(&mut self, delta_time: f64) {
        self.time_manager.update(delta_time);
        let frame_dt = self.time_manager.delta_time() as f32;

        self.world.event_pre_update_all_systems();
        self.world.event_update_systems(frame_dt);

        let fixed_dt = self.time_manager.fixed_step().step as f32;
        let mut fixed_steps = 0;
        while self.time_manager.next_fixed_step() {
            self.world.event_fixed_update_systems(fixed_dt);
            fixed_steps += 1;
        }

        self.world.event_post_update_all_systems();

        tracing::trace!(
            target: "frame",
            frame = self.time_manager.frame_count(),
            delta_time = frame_dt,
            fixed_steps,
            "Frame updated"
        );
    }

    /// Run every render hook
    pub fn render(&mut self) {
        self.world.event_render_systems();
    }

    /// Unregister every system
    pub fn shutdown(&mut self) {
        tracing::debug!(
            target: "frame",
            frames = self.time_manager.frame_count(),
            "Engine shutting down"
        );
        self.world.shutdown();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_valid_config(EngineConfig::default())
    }
}
