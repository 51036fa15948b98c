//! Engine configuration
//!
//! Limits for the ECS and time-step settings. Every field has a default, so a
//! partial JSON document only needs to name what it overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Capacity limits for the entity component system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Hard cap on entity ids handed out by the allocator
    pub max_entities: u32,
    /// Number of sequential ids seeded into the free queue up front
    pub initial_entity_pool: u32,
    /// Maximum number of distinct component types
    pub max_component_types: u32,
    /// Maximum number of registered systems
    pub max_systems: usize,
    /// Capacity of each per-hook dispatch list
    pub max_systems_per_hook: usize,
    /// Maximum entities a single system can track
    pub max_entities_per_system: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: 200_000,
            initial_entity_pool: 1_000,
            max_component_types: 32,
            max_systems: 128,
            max_systems_per_hook: 32,
            max_entities_per_system: 200_000,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ECS limits
    pub ecs: EcsConfig,
    /// Fixed simulation timestep in seconds
    pub fixed_timestep: f64,
    /// Maximum fixed updates run in a single frame
    pub max_fixed_updates: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ecs: EcsConfig::default(),
            fixed_timestep: 1.0 / 60.0,
            max_fixed_updates: 8,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject limits that would make the engine unusable
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.ecs.max_entities == 0 {
            return invalid("ecs.max_entities", "must be greater than zero");
        }
        if self.ecs.max_component_types == 0 {
            return invalid("ecs.max_component_types", "must be greater than zero");
        }
        if self.ecs.max_systems == 0 {
            return invalid("ecs.max_systems", "must be greater than zero");
        }
        if self.ecs.max_systems_per_hook == 0 {
            return invalid("ecs.max_systems_per_hook", "must be greater than zero");
        }
        if self.ecs.max_entities_per_system == 0 {
            return invalid("ecs.max_entities_per_system", "must be greater than zero");
        }
        if self.fixed_timestep.is_nan() || self.fixed_timestep <= 0.0 {
            return invalid("fixed_timestep", "must be positive");
        }
        if self.max_fixed_updates == 0 {
            return invalid("max_fixed_updates", "must be greater than zero");
        }
        Ok(())
    }
}
