//! Systems and dispatch
//!
//! A system declares the component [`Signature`] it needs and which frame hooks
//! it implements. The registry keeps every entity whose signature contains the
//! system's signature in that system's entity list, and dispatches each hook
//! to the systems that advertise it, in registration order.

use ahash::AHashSet;
use bitflags::bitflags;

use super::component::ComponentStore;
use super::entity::Entity;
use super::signature::Signature;
use super::{EcsError, EcsResult};
use crate::config::EcsConfig;

bitflags! {
    /// Frame and lifecycle hooks a system takes part in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SystemHooks: u16 {
        const ENTITY_START = 1 << 0;
        const ENTITY_END = 1 << 1;
        const ENTITY_ENTERED_SCENE = 1 << 2;
        const PRE_UPDATE_ALL = 1 << 3;
        const POST_UPDATE_ALL = 1 << 4;
        const UPDATE = 1 << 5;
        const FIXED_UPDATE = 1 << 6;
        const RENDER = 1 << 7;
        const NETWORK_CALLBACK = 1 << 8;
    }
}

/// One dispatch list per hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    EntityStart,
    EntityEnd,
    EntityEnteredScene,
    PreUpdateAll,
    PostUpdateAll,
    Update,
    FixedUpdate,
    Render,
    NetworkCallback,
}

impl Hook {
    /// Number of hooks
    pub const COUNT: usize = 9;

    /// Every hook in dispatch-list order
    pub const ALL: [Hook; Self::COUNT] = [
        Hook::EntityStart,
        Hook::EntityEnd,
        Hook::EntityEnteredScene,
        Hook::PreUpdateAll,
        Hook::PostUpdateAll,
        Hook::Update,
        Hook::FixedUpdate,
        Hook::Render,
        Hook::NetworkCallback,
    ];

    /// Capability flag for this hook
    pub fn flag(self) -> SystemHooks {
        match self {
            Hook::EntityStart => SystemHooks::ENTITY_START,
            Hook::EntityEnd => SystemHooks::ENTITY_END,
            Hook::EntityEnteredScene => SystemHooks::ENTITY_ENTERED_SCENE,
            Hook::PreUpdateAll => SystemHooks::PRE_UPDATE_ALL,
            Hook::PostUpdateAll => SystemHooks::POST_UPDATE_ALL,
            Hook::Update => SystemHooks::UPDATE,
            Hook::FixedUpdate => SystemHooks::FIXED_UPDATE,
            Hook::Render => SystemHooks::RENDER,
            Hook::NetworkCallback => SystemHooks::NETWORK_CALLBACK,
        }
    }
}

/// Identifier of a registered system, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(usize);

impl SystemId {
    /// Position in registration order
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What a hook gets to work with
pub struct SystemContext<'a> {
    /// Entities currently matching the system, in insertion order
    pub entities: &'a [Entity],
    /// Component storage
    pub components: &'a mut ComponentStore,
}

/// A unit of game logic.
///
/// Only the hooks advertised by [`System::hooks`] are dispatched from the frame
/// loop. Membership callbacks always fire.
pub trait System: 'static {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Hooks this system implements
    fn hooks(&self) -> SystemHooks {
        SystemHooks::empty()
    }

    /// Called once when the system is registered
    fn on_register(&mut self) {}

    /// Called once when the registry shuts down
    fn on_unregister(&mut self) {}

    /// An entity started matching this system's signature
    fn on_entity_registered(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity) {}

    /// An entity stopped matching this system's signature
    fn on_entity_unregistered(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity) {}

    /// A tracked entity started
    fn on_entity_start(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity) {}

    /// A tracked entity is about to end
    fn on_entity_end(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity) {}

    /// A tracked entity entered the scene
    fn on_entity_entered_scene(&mut self, _ctx: &mut SystemContext<'_>, _entity: Entity) {}

    /// Start of the frame, before any update
    fn pre_update_all(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// End of the frame, after every update
    fn post_update_all(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// Variable-step update with the frame's delta time
    fn update(&mut self, _ctx: &mut SystemContext<'_>, _delta_time: f32) {}

    /// Fixed-step update, run zero or more times per frame
    fn fixed_update(&mut self, _ctx: &mut SystemContext<'_>, _delta_time: f32) {}

    /// Draw the current state
    fn render(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// A network message arrived
    fn network_callback(&mut self, _ctx: &mut SystemContext<'_>, _message: &str) {}
}

struct SystemEntry {
    system: Box<dyn System>,
    signature: Signature,
    entities: Vec<Entity>,
    members: AHashSet<Entity>,
}

impl SystemEntry {
    fn context<'a>(
        &'a mut self,
        components: &'a mut ComponentStore,
    ) -> (&'a mut dyn System, SystemContext<'a>) {
        let SystemEntry {
            system, entities, ..
        } = self;
        (
            system.as_mut(),
            SystemContext {
                entities: entities.as_slice(),
                components,
            },
        )
    }

    fn insert(
        &mut self,
        entity: Entity,
        components: &mut ComponentStore,
        max_entities: usize,
    ) -> EcsResult<bool> {
        if self.members.contains(&entity) {
            log::warn!(
                "Entity {} is already registered with system `{}`",
                entity,
                self.system.name()
            );
            return Ok(false);
        }
        if self.entities.len() >= max_entities {
            return Err(EcsError::SystemEntityLimitReached {
                system: self.system.name().to_string(),
                max: max_entities,
            });
        }

        self.entities.push(entity);
        self.members.insert(entity);
        log::trace!("Entity {} entered system `{}`", entity, self.system.name());

        let (system, mut ctx) = self.context(components);
        system.on_entity_registered(&mut ctx, entity);
        Ok(true)
    }

    fn remove(&mut self, entity: Entity, components: &mut ComponentStore) -> bool {
        if !self.members.contains(&entity) {
            return false;
        }

        let (system, mut ctx) = self.context(components);
        system.on_entity_unregistered(&mut ctx, entity);

        if let Some(position) = self.entities.iter().position(|&e| e == entity) {
            self.entities.remove(position);
        }
        self.members.remove(&entity);
        log::trace!("Entity {} left system `{}`", entity, self.system.name());
        true
    }
}

/// Registered systems and their per-hook dispatch lists
pub struct SystemRegistry {
    systems: Vec<SystemEntry>,
    hook_lists: [Vec<SystemId>; Hook::COUNT],
    max_systems: usize,
    max_systems_per_hook: usize,
    max_entities_per_system: usize,
}

impl SystemRegistry {
    /// Create an empty registry
    pub fn new(config: &EcsConfig) -> Self {
        Self {
            systems: Vec::new(),
            hook_lists: Default::default(),
            max_systems: config.max_systems,
            max_systems_per_hook: config.max_systems_per_hook,
            max_entities_per_system: config.max_entities_per_system,
        }
    }

    /// Register a system requiring `signature`
    pub fn register(&mut self, signature: Signature, system: Box<dyn System>) -> EcsResult<SystemId> {
        if self.systems.len() >= self.max_systems {
            return Err(EcsError::SystemLimitReached {
                max: self.max_systems,
            });
        }

        let hooks = system.hooks();
        for hook in Hook::ALL {
            if hooks.contains(hook.flag())
                && self.hook_lists[hook as usize].len() >= self.max_systems_per_hook
            {
                return Err(EcsError::HookListFull {
                    hook,
                    max: self.max_systems_per_hook,
                });
            }
        }

        let id = SystemId(self.systems.len());
        log::debug!(
            "Registering system `{}` with signature {:?} and hooks {:?}",
            system.name(),
            signature,
            hooks
        );
        self.systems.push(SystemEntry {
            system,
            signature,
            entities: Vec::new(),
            members: AHashSet::new(),
        });
        self.systems[id.0].system.on_register();

        for hook in Hook::ALL {
            if hooks.contains(hook.flag()) {
                self.hook_lists[hook as usize].push(id);
            }
        }
        Ok(id)
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check if no system is registered
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Name of a system
    pub fn name(&self, id: SystemId) -> Option<&str> {
        self.systems.get(id.0).map(|entry| entry.system.name())
    }

    /// Signature a system requires
    pub fn signature(&self, id: SystemId) -> Option<&Signature> {
        self.systems.get(id.0).map(|entry| &entry.signature)
    }

    /// Entities a system currently tracks, in insertion order
    pub fn entities(&self, id: SystemId) -> &[Entity] {
        self.systems
            .get(id.0)
            .map_or(&[], |entry| entry.entities.as_slice())
    }

    /// Check if a system tracks an entity
    pub fn contains_entity(&self, id: SystemId, entity: Entity) -> bool {
        self.systems
            .get(id.0)
            .is_some_and(|entry| entry.members.contains(&entity))
    }

    /// Systems dispatched for a hook, in registration order
    pub fn systems_with_hook(&self, hook: Hook) -> &[SystemId] {
        &self.hook_lists[hook as usize]
    }

    fn entry_mut(&mut self, id: SystemId) -> EcsResult<&mut SystemEntry> {
        self.systems.get_mut(id.0).ok_or(EcsError::UnknownSystem(id))
    }

    /// Add an entity to a system's list. Duplicates are ignored with a warning.
    pub fn insert_entity_into_system(
        &mut self,
        id: SystemId,
        entity: Entity,
        components: &mut ComponentStore,
    ) -> EcsResult<bool> {
        let max_entities = self.max_entities_per_system;
        self.entry_mut(id)?.insert(entity, components, max_entities)
    }

    /// Remove an entity from a system's list, keeping the order of the rest
    pub fn remove_entity_from_system(
        &mut self,
        id: SystemId,
        entity: Entity,
        components: &mut ComponentStore,
    ) -> EcsResult<bool> {
        Ok(self.entry_mut(id)?.remove(entity, components))
    }

    /// Remove an entity from every system tracking it. Returns how many did.
    pub fn remove_entity_from_all_systems(
        &mut self,
        entity: Entity,
        components: &mut ComponentStore,
    ) -> usize {
        let mut removed = 0;
        for entry in &mut self.systems {
            if entry.remove(entity, components) {
                removed += 1;
            }
        }
        removed
    }

    /// Re-evaluate an entity against every system after its components changed.
    ///
    /// Fails before touching any list if a system the entity would join is full.
    pub fn update_entity_signature_with_systems(
        &mut self,
        entity: Entity,
        components: &mut ComponentStore,
    ) -> EcsResult<()> {
        let signature = components.signature(entity);
        let max_entities = self.max_entities_per_system;

        let full = self.systems.iter().find(|entry| {
            signature.contains_all(&entry.signature)
                && !entry.members.contains(&entity)
                && entry.entities.len() >= max_entities
        });
        if let Some(entry) = full {
            return Err(EcsError::SystemEntityLimitReached {
                system: entry.system.name().to_string(),
                max: max_entities,
            });
        }

        for entry in &mut self.systems {
            let matched = signature.contains_all(&entry.signature);
            let member = entry.members.contains(&entity);
            if matched && !member {
                entry.insert(entity, components, max_entities)?;
            } else if !matched && member {
                entry.remove(entity, components);
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        hook: Hook,
        components: &mut ComponentStore,
        mut call: impl FnMut(&mut dyn System, &mut SystemContext<'_>),
    ) {
        for id in &self.hook_lists[hook as usize] {
            let (system, mut ctx) = self.systems[id.0].context(components);
            call(system, &mut ctx);
        }
    }

    fn dispatch_entity(
        &mut self,
        hook: Hook,
        entity: Entity,
        components: &mut ComponentStore,
        mut call: impl FnMut(&mut dyn System, &mut SystemContext<'_>, Entity),
    ) {
        for id in &self.hook_lists[hook as usize] {
            let entry = &mut self.systems[id.0];
            if entry.members.contains(&entity) {
                let (system, mut ctx) = entry.context(components);
                call(system, &mut ctx, entity);
            }
        }
    }

    /// Notify systems tracking `entity` that it started
    pub fn event_entity_start(&mut self, entity: Entity, components: &mut ComponentStore) {
        self.dispatch_entity(Hook::EntityStart, entity, components, |system, ctx, entity| {
            system.on_entity_start(ctx, entity)
        });
    }

    /// Notify systems tracking `entity` that it is ending
    pub fn event_entity_end(&mut self, entity: Entity, components: &mut ComponentStore) {
        self.dispatch_entity(Hook::EntityEnd, entity, components, |system, ctx, entity| {
            system.on_entity_end(ctx, entity)
        });
    }

    /// Notify systems tracking `entity` that it entered the scene
    pub fn event_entity_entered_scene(&mut self, entity: Entity, components: &mut ComponentStore) {
        self.dispatch_entity(
            Hook::EntityEnteredScene,
            entity,
            components,
            |system, ctx, entity| system.on_entity_entered_scene(ctx, entity),
        );
    }

    /// Run every pre-update-all hook
    pub fn event_pre_update_all_systems(&mut self, components: &mut ComponentStore) {
        self.dispatch(Hook::PreUpdateAll, components, |system, ctx| {
            system.pre_update_all(ctx)
        });
    }

    /// Run every post-update-all hook
    pub fn event_post_update_all_systems(&mut self, components: &mut ComponentStore) {
        self.dispatch(Hook::PostUpdateAll, components, |system, ctx| {
            system.post_update_all(ctx)
        });
    }

    /// Run every update hook
    pub fn event_update_systems(&mut self, components: &mut ComponentStore, delta_time: f32) {
        self.dispatch(Hook::Update, components, |system, ctx| {
            system.update(ctx, delta_time)
        });
    }

    /// Run every fixed-update hook
    pub fn event_fixed_update_systems(&mut self, components: &mut ComponentStore, delta_time: f32) {
        self.dispatch(Hook::FixedUpdate, components, |system, ctx| {
            system.fixed_update(ctx, delta_time)
        });
    }

    /// Run every render hook
    pub fn event_render_systems(&mut self, components: &mut ComponentStore) {
        self.dispatch(Hook::Render, components, |system, ctx| system.render(ctx));
    }

    /// Deliver a network message to every system listening for one
    pub fn event_network_callback(&mut self, components: &mut ComponentStore, message: &str) {
        self.dispatch(Hook::NetworkCallback, components, |system, ctx| {
            system.network_callback(ctx, message)
        });
    }

    /// Fire `on_unregister` for every system in registration order and clear the registry
    pub fn shutdown(&mut self) {
        for mut entry in self.systems.drain(..) {
            log::debug!("Unregistering system `{}`", entry.system.name());
            entry.system.on_unregister();
        }
        for list in &mut self.hook_lists {
            list.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Calls {
        registered: Vec<Entity>,
        unregistered: Vec<Entity>,
        updates: u32,
        log: Vec<String>,
    }

    struct Recorder {
        name: String,
        hooks: SystemHooks,
        calls: Rc<RefCell<Calls>>,
    }

    impl Recorder {
        fn new(name: &str, hooks: SystemHooks, calls: &Rc<RefCell<Calls>>) -> Box<dyn System> {
            Box::new(Self {
                name: name.to_string(),
                hooks,
                calls: Rc::clone(calls),
            })
        }
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn hooks(&self) -> SystemHooks {
            self.hooks
        }

        fn on_entity_registered(&mut self, _ctx: &mut SystemContext<'_>, entity: Entity) {
            self.calls.borrow_mut().registered.push(entity);
        }

        fn on_entity_unregistered(&mut self, ctx: &mut SystemContext<'_>, entity: Entity) {
            assert!(ctx.entities.contains(&entity));
            self.calls.borrow_mut().unregistered.push(entity);
        }

        fn on_entity_start(&mut self, _ctx: &mut SystemContext<'_>, entity: Entity) {
            self.calls.borrow_mut().log.push(format!("{}:start:{}", self.name, entity));
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>, _delta_time: f32) {
            let mut calls = self.calls.borrow_mut();
            calls.updates += 1;
            calls.log.push(format!("{}:update:{}", self.name, ctx.entities.len()));
        }

        fn render(&mut self, _ctx: &mut SystemContext<'_>) {
            self.calls.borrow_mut().log.push(format!("{}:render", self.name));
        }
    }

    struct Position;
    struct Velocity;

    fn setup() -> (SystemRegistry, ComponentStore) {
        let config = EcsConfig::default();
        let mut components = ComponentStore::new(&config);
        components.register::<Position>().unwrap();
        components.register::<Velocity>().unwrap();
        (SystemRegistry::new(&config), components)
    }

    #[test]
    fn test_membership_follows_signature() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let id = registry
            .register(Signature::from_index(0), Recorder::new("movement", SystemHooks::empty(), &calls))
            .unwrap();

        let entity = Entity::from_raw(0);
        components.set_component(entity, Position).unwrap();
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        assert_eq!(registry.entities(id), &[entity]);
        assert_eq!(calls.borrow().registered, vec![entity]);

        // Unchanged signature: no second registration
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        assert_eq!(calls.borrow().registered.len(), 1);

        components.remove_component::<Position>(entity).unwrap();
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        assert!(registry.entities(id).is_empty());
        assert_eq!(calls.borrow().unregistered, vec![entity]);
    }

    #[test]
    fn test_requires_every_component() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let both: Signature = [0, 1].into_iter().collect();
        let id = registry
            .register(both, Recorder::new("physics", SystemHooks::empty(), &calls))
            .unwrap();

        let entity = Entity::from_raw(7);
        components.set_component(entity, Position).unwrap();
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        assert!(!registry.contains_entity(id, entity));

        components.set_component(entity, Velocity).unwrap();
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        assert!(registry.contains_entity(id, entity));
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let id = registry
            .register(Signature::new(), Recorder::new("dup", SystemHooks::empty(), &calls))
            .unwrap();

        let entity = Entity::from_raw(1);
        assert!(registry.insert_entity_into_system(id, entity, &mut components).unwrap());
        assert!(!registry.insert_entity_into_system(id, entity, &mut components).unwrap());
        assert_eq!(registry.entities(id).len(), 1);
        assert_eq!(calls.borrow().registered.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        let id = registry
            .register(Signature::new(), Recorder::new("ordered", SystemHooks::empty(), &calls))
            .unwrap();

        let entities: Vec<Entity> = (0..5).map(Entity::from_raw).collect();
        for &entity in &entities {
            registry.insert_entity_into_system(id, entity, &mut components).unwrap();
        }

        assert!(registry.remove_entity_from_system(id, entities[1], &mut components).unwrap());
        assert!(registry.remove_entity_from_system(id, entities[3], &mut components).unwrap());
        assert!(!registry.remove_entity_from_system(id, entities[3], &mut components).unwrap());

        assert_eq!(registry.entities(id), &[entities[0], entities[2], entities[4]]);
        assert_eq!(calls.borrow().unregistered, vec![entities[1], entities[3]]);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        registry
            .register(Signature::new(), Recorder::new("a", SystemHooks::UPDATE, &calls))
            .unwrap();
        registry
            .register(Signature::new(), Recorder::new("b", SystemHooks::RENDER, &calls))
            .unwrap();
        registry
            .register(
                Signature::new(),
                Recorder::new("c", SystemHooks::UPDATE | SystemHooks::RENDER, &calls),
            )
            .unwrap();

        assert_eq!(registry.systems_with_hook(Hook::Update).len(), 2);
        assert_eq!(registry.systems_with_hook(Hook::Render).len(), 2);
        assert!(registry.systems_with_hook(Hook::FixedUpdate).is_empty());

        registry.event_update_systems(&mut components, 0.016);
        registry.event_render_systems(&mut components);
        registry.event_fixed_update_systems(&mut components, 0.016);

        assert_eq!(
            calls.borrow().log,
            vec!["a:update:0", "c:update:0", "b:render", "c:render"]
        );
        assert_eq!(calls.borrow().updates, 2);
    }

    #[test]
    fn test_entity_event_only_reaches_members() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        registry
            .register(Signature::from_index(0), Recorder::new("pos", SystemHooks::ENTITY_START, &calls))
            .unwrap();
        registry
            .register(Signature::from_index(1), Recorder::new("vel", SystemHooks::ENTITY_START, &calls))
            .unwrap();

        let entity = Entity::from_raw(2);
        components.set_component(entity, Position).unwrap();
        registry.update_entity_signature_with_systems(entity, &mut components).unwrap();
        registry.event_entity_start(entity, &mut components);

        assert_eq!(calls.borrow().log, vec!["pos:start:2"]);
    }

    #[test]
    fn test_system_limits() {
        let config = EcsConfig {
            max_systems: 2,
            max_systems_per_hook: 1,
            max_entities_per_system: 1,
            ..EcsConfig::default()
        };
        let mut registry = SystemRegistry::new(&config);
        let mut components = ComponentStore::new(&config);
        let calls = Rc::new(RefCell::new(Calls::default()));

        let id = registry
            .register(Signature::new(), Recorder::new("first", SystemHooks::UPDATE, &calls))
            .unwrap();
        let err = registry
            .register(Signature::new(), Recorder::new("second", SystemHooks::UPDATE, &calls))
            .unwrap_err();
        assert_eq!(err, EcsError::HookListFull { hook: Hook::Update, max: 1 });
        assert_eq!(registry.len(), 1);

        registry
            .register(Signature::new(), Recorder::new("third", SystemHooks::RENDER, &calls))
            .unwrap();
        let err = registry
            .register(Signature::new(), Recorder::new("fourth", SystemHooks::empty(), &calls))
            .unwrap_err();
        assert_eq!(err, EcsError::SystemLimitReached { max: 2 });

        registry
            .insert_entity_into_system(id, Entity::from_raw(0), &mut components)
            .unwrap();
        let err = registry
            .insert_entity_into_system(id, Entity::from_raw(1), &mut components)
            .unwrap_err();
        assert!(matches!(err, EcsError::SystemEntityLimitReached { max: 1, .. }));
    }

    #[test]
    fn test_full_system_blocks_every_join() {
        let config = EcsConfig {
            max_entities_per_system: 1,
            ..EcsConfig::default()
        };
        let mut registry = SystemRegistry::new(&config);
        let mut components = ComponentStore::new(&config);
        components.register::<Position>().unwrap();
        let calls = Rc::new(RefCell::new(Calls::default()));

        let first = registry
            .register(Signature::from_index(0), Recorder::new("first", SystemHooks::empty(), &calls))
            .unwrap();
        let any = registry
            .register(Signature::new(), Recorder::new("any", SystemHooks::empty(), &calls))
            .unwrap();
        let second = registry
            .register(Signature::from_index(0), Recorder::new("second", SystemHooks::empty(), &calls))
            .unwrap();

        let resident = Entity::from_raw(0);
        registry.insert_entity_into_system(any, resident, &mut components).unwrap();

        let entity = Entity::from_raw(1);
        components.set_component(entity, Position).unwrap();
        let err = registry
            .update_entity_signature_with_systems(entity, &mut components)
            .unwrap_err();
        assert_eq!(
            err,
            EcsError::SystemEntityLimitReached {
                system: "any".to_string(),
                max: 1
            }
        );

        // No system changed membership
        assert!(registry.entities(first).is_empty());
        assert_eq!(registry.entities(any), &[resident]);
        assert!(registry.entities(second).is_empty());
        assert_eq!(calls.borrow().registered, vec![resident]);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let (mut registry, mut components) = setup();
        let calls = Rc::new(RefCell::new(Calls::default()));
        registry
            .register(Signature::new(), Recorder::new("a", SystemHooks::UPDATE, &calls))
            .unwrap();

        registry.shutdown();
        assert!(registry.is_empty());
        assert!(registry.systems_with_hook(Hook::Update).is_empty());

        registry.event_update_systems(&mut components, 0.016);
        assert_eq!(calls.borrow().updates, 0);
    }
}
