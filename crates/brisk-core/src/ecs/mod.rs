//! Entity Component System (ECS)
//!
//! Signature-based ECS for a single-threaded game loop.
//! Features:
//! - Recycled entity ids handed out from a FIFO queue
//! - Name-registered component types, one signature bit per type
//! - Dense per-type component columns indexed by entity id
//! - Systems that track every entity whose signature contains theirs, with
//!   per-hook dispatch lists
//!
//! [`World`] ties the pieces together. Each world is independent, so tests and
//! tools can run as many as they like side by side.

pub mod component;
pub mod entity;
pub mod signature;
pub mod system;

use thiserror::Error;

pub use component::{Component, ComponentRegistry, ComponentStore, ComponentTypeInfo};
pub use entity::{Entity, EntityAllocator};
pub use signature::Signature;
pub use system::{Hook, System, SystemContext, SystemHooks, SystemId, SystemRegistry};

use crate::config::EcsConfig;

/// ECS errors
///
/// Limit violations and lookups of things that must exist. These indicate a
/// misconfigured engine or a programming error rather than a runtime condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    #[error("Entity limit reached: at most {max} entities can exist")]
    EntityLimitReached { max: u32 },

    #[error("Entity {0} is outside the configured entity range")]
    EntityOutOfRange(Entity),

    #[error("Cannot register component type `{name}`: limit of {max} types reached")]
    ComponentTypeLimitReached { name: String, max: u32 },

    #[error("Component type `{name}` is registered with size {registered}, not {requested}")]
    ComponentSizeMismatch {
        name: String,
        registered: usize,
        requested: usize,
    },

    #[error("Component type `{0}` is not registered")]
    UnregisteredComponentType(String),

    #[error("Component name `{0}` is already bound to a different type")]
    ComponentNameConflict(String),

    #[error("Entity {entity} has no `{component}` component")]
    MissingComponent { entity: Entity, component: String },

    #[error("System limit reached: at most {max} systems can be registered")]
    SystemLimitReached { max: usize },

    #[error("Too many systems implement {hook:?}: limit is {max}")]
    HookListFull { hook: Hook, max: usize },

    #[error("System `{system}` cannot track more than {max} entities")]
    SystemEntityLimitReached { system: String, max: usize },

    #[error("Unknown system {0:?}")]
    UnknownSystem(SystemId),
}

/// Result type for ECS operations
pub type EcsResult<T> = Result<T, EcsError>;

/// The ECS world: entity ids, component storage and systems
pub struct World {
    config: EcsConfig,
    entities: EntityAllocator,
    components: ComponentStore,
    systems: SystemRegistry,
}

impl World {
    /// Create an empty world with the given limits
    pub fn new(config: EcsConfig) -> Self {
        Self {
            entities: EntityAllocator::new(&config),
            components: ComponentStore::new(&config),
            systems: SystemRegistry::new(&config),
            config,
        }
    }

    /// Limits this world was created with
    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    // Entities

    /// Allocate an entity
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        self.entities.create()
    }

    /// Return an entity id to the pool without touching its components or systems
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.entities.destroy(entity)
    }

    /// End an entity: fire the entity-end hooks, leave every system, drop all
    /// components and return the id to the pool
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.systems.event_entity_end(entity, &mut self.components);
        self.systems
            .remove_entity_from_all_systems(entity, &mut self.components);
        self.components.remove_all_components(entity);
        self.entities.destroy(entity)
    }

    /// Check if an entity is live
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn active_entity_count(&self) -> usize {
        self.entities.active_count()
    }

    // Component types

    /// Register a Rust component type
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentTypeInfo> {
        self.components.register::<T>()
    }

    /// Register a component type by name and size only
    pub fn register_component_type(&mut self, name: &str, size: usize) -> EcsResult<ComponentTypeInfo> {
        self.components.register_type(name, size)
    }

    /// Checked type lookup
    pub fn get_type_info(&self, name: &str, size: usize) -> EcsResult<&ComponentTypeInfo> {
        self.components.registry().get_type_info(name, size)
    }

    /// Type lookup by name
    pub fn find_type_info(&self, name: &str) -> Option<&ComponentTypeInfo> {
        self.components.registry().find_type_info(name)
    }

    // Components

    /// Component storage
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Mutable component storage. Structural changes made here need a call to
    /// [`World::update_entity_signature_with_systems`].
    pub fn components_mut(&mut self) -> &mut ComponentStore {
        &mut self.components
    }

    /// Attach a component without re-evaluating system membership
    pub fn set_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.components.set_component(entity, component)
    }

    /// Attach a component and update system membership
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.components.set_component(entity, component)?;
        self.update_entity_signature_with_systems(entity)
    }

    /// Component the entity must have
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.components.get_component(entity)
    }

    /// Mutable component the entity must have
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.components.get_component_mut(entity)
    }

    /// Component, if the entity has one
    pub fn find_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.components.find_component(entity)
    }

    /// Mutable component, if the entity has one
    pub fn find_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.find_component_mut(entity)
    }

    /// Detach a component without re-evaluating system membership
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<Option<T>> {
        self.components.remove_component(entity)
    }

    /// Detach a component and update system membership
    pub fn take_component<T: Component>(&mut self, entity: Entity) -> EcsResult<Option<T>> {
        let removed = self.components.remove_component(entity)?;
        self.update_entity_signature_with_systems(entity)?;
        Ok(removed)
    }

    /// Check if an entity has a component type
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.components.has_component::<T>(entity)
    }

    /// Signature of the components attached to an entity
    pub fn component_signature(&self, entity: Entity) -> Signature {
        self.components.signature(entity)
    }

    // Systems

    /// System registry
    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    /// Register a system requiring `signature`
    pub fn register_system<S: System>(&mut self, signature: Signature, system: S) -> EcsResult<SystemId> {
        self.systems.register(signature, Box::new(system))
    }

    /// Register a system whose signature is a comma-separated list of component names
    pub fn register_system_with_signature_string<S: System>(
        &mut self,
        component_names: &str,
        system: S,
    ) -> EcsResult<SystemId> {
        let signature = Signature::from_names(component_names, self.components.registry())?;
        self.register_system(signature, system)
    }

    /// Entities a system currently tracks
    pub fn system_entities(&self, id: SystemId) -> &[Entity] {
        self.systems.entities(id)
    }

    /// Re-evaluate an entity against every system
    pub fn update_entity_signature_with_systems(&mut self, entity: Entity) -> EcsResult<()> {
        self.systems
            .update_entity_signature_with_systems(entity, &mut self.components)
    }

    // Dispatch

    /// Notify systems tracking `entity` that it started
    pub fn event_entity_start(&mut self, entity: Entity) {
        self.systems.event_entity_start(entity, &mut self.components);
    }

    /// Notify systems tracking `entity` that it is ending
    pub fn event_entity_end(&mut self, entity: Entity) {
        self.systems.event_entity_end(entity, &mut self.components);
    }

    /// Notify systems tracking `entity` that it entered the scene
    pub fn event_entity_entered_scene(&mut self, entity: Entity) {
        self.systems
            .event_entity_entered_scene(entity, &mut self.components);
    }

    /// Run every pre-update-all hook
    pub fn event_pre_update_all_systems(&mut self) {
        self.systems.event_pre_update_all_systems(&mut self.components);
    }

    /// Run every post-update-all hook
    pub fn event_post_update_all_systems(&mut self) {
        self.systems.event_post_update_all_systems(&mut self.components);
    }

    /// Run every update hook
    pub fn event_update_systems(&mut self, delta_time: f32) {
        self.systems
            .event_update_systems(&mut self.components, delta_time);
    }

    /// Run every fixed-update hook
    pub fn event_fixed_update_systems(&mut self, delta_time: f32) {
        self.systems
            .event_fixed_update_systems(&mut self.components, delta_time);
    }

    /// Run every render hook
    pub fn event_render_systems(&mut self) {
        self.systems.event_render_systems(&mut self.components);
    }

    /// Deliver a network message to listening systems
    pub fn event_network_callback(&mut self, message: &str) {
        self.systems
            .event_network_callback(&mut self.components, message);
    }

    /// Unregister every system
    pub fn shutdown(&mut self) {
        self.systems.shutdown();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(EcsConfig::default())
    }
}
