//! Component types and storage
//!
//! Component types are registered once by name. Each registration receives a
//! stable index, which doubles as the bit position of the type's flag in a
//! [`Signature`]. Instances live in one dense column per component index,
//! addressed by entity id.

use std::any::{Any, TypeId};

use ahash::AHashMap;
use indexmap::IndexMap;

use super::entity::Entity;
use super::signature::Signature;
use super::{EcsError, EcsResult};
use crate::config::EcsConfig;

/// Marker trait for components
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Registered component type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTypeInfo {
    name: String,
    index: u32,
    size: usize,
}

impl ComponentTypeInfo {
    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dense index, also the flag's bit position
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Size in bytes of one instance
    pub fn size(&self) -> usize {
        self.size
    }

    /// Single-bit signature for this type
    pub fn flag(&self) -> Signature {
        Signature::from_index(self.index)
    }
}

/// Last path segment of a type name, without generic arguments
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Name-keyed registry of component types
#[derive(Debug)]
pub struct ComponentRegistry {
    /// Position in the map is the component index
    types: IndexMap<String, ComponentTypeInfo>,
    by_type_id: AHashMap<TypeId, u32>,
    max_types: u32,
}

impl ComponentRegistry {
    /// Create an empty registry allowing `max_types` registrations
    pub fn new(max_types: u32) -> Self {
        Self {
            types: IndexMap::new(),
            by_type_id: AHashMap::new(),
            max_types,
        }
    }

    /// Register a component type by name and size.
    ///
    /// Registering a name twice returns the existing info as long as the size
    /// matches.
    pub fn register_type(&mut self, name: &str, size: usize) -> EcsResult<ComponentTypeInfo> {
        if let Some(existing) = self.types.get(name) {
            if existing.size != size {
                return Err(EcsError::ComponentSizeMismatch {
                    name: name.to_string(),
                    registered: existing.size,
                    requested: size,
                });
            }
            return Ok(existing.clone());
        }

        if self.types.len() >= self.max_types as usize {
            return Err(EcsError::ComponentTypeLimitReached {
                name: name.to_string(),
                max: self.max_types,
            });
        }

        let info = ComponentTypeInfo {
            name: name.to_string(),
            index: self.types.len() as u32,
            size,
        };
        log::debug!(
            "Registered component type `{}` (index {}, {} bytes)",
            info.name,
            info.index,
            info.size
        );
        self.types.insert(info.name.clone(), info.clone());
        Ok(info)
    }

    /// Register a Rust type under its short type name
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentTypeInfo> {
        let name = short_type_name::<T>();
        let info = self.register_type(name, std::mem::size_of::<T>())?;
        let type_id = TypeId::of::<T>();

        let claimed_by_other = self
            .by_type_id
            .iter()
            .any(|(id, &index)| index == info.index && *id != type_id);
        if claimed_by_other {
            return Err(EcsError::ComponentNameConflict(name.to_string()));
        }

        self.by_type_id.insert(type_id, info.index);
        Ok(info)
    }

    /// Look up a type by name, failing if it is absent or its size differs
    pub fn get_type_info(&self, name: &str, size: usize) -> EcsResult<&ComponentTypeInfo> {
        let info = self
            .find_type_info(name)
            .ok_or_else(|| EcsError::UnregisteredComponentType(name.to_string()))?;
        if info.size != size {
            return Err(EcsError::ComponentSizeMismatch {
                name: name.to_string(),
                registered: info.size,
                requested: size,
            });
        }
        Ok(info)
    }

    /// Look up a type by name
    pub fn find_type_info(&self, name: &str) -> Option<&ComponentTypeInfo> {
        self.types.get(name)
    }

    /// Look up the info bound to a Rust type
    pub fn type_info<T: Component>(&self) -> Option<&ComponentTypeInfo> {
        let index = self.index_of::<T>()?;
        self.info_at(index)
    }

    /// Component index bound to a Rust type
    pub fn index_of<T: Component>(&self) -> Option<u32> {
        self.by_type_id.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a type by component index
    pub fn info_at(&self, index: u32) -> Option<&ComponentTypeInfo> {
        self.types.get_index(index as usize).map(|(_, info)| info)
    }

    /// Registered types in index order
    pub fn iter(&self) -> impl Iterator<Item = &ComponentTypeInfo> {
        self.types.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Type-erased column of component instances
trait ComponentColumn: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove(&mut self, entity: Entity) -> bool;
}

/// Dense column indexed by entity id
struct TypedColumn<T: Component> {
    data: Vec<Option<T>>,
}

impl<T: Component> TypedColumn<T> {
    fn new() -> Self {
        Self { data: Vec::new() }
    }

    fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        let index = entity.index();
        if self.data.len() <= index {
            self.data.resize_with(index + 1, || None);
        }
        self.data[index].replace(component)
    }

    fn get(&self, entity: Entity) -> Option<&T> {
        self.data.get(entity.index())?.as_ref()
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.data.get_mut(entity.index())?.as_mut()
    }

    fn take(&mut self, entity: Entity) -> Option<T> {
        self.data.get_mut(entity.index())?.take()
    }
}

impl<T: Component> ComponentColumn for TypedColumn<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }
}

/// Owns every component instance and every entity signature
pub struct ComponentStore {
    registry: ComponentRegistry,
    /// Indexed by component index; `None` for name-only registrations
    columns: Vec<Option<Box<dyn ComponentColumn>>>,
    /// Indexed by entity id
    signatures: Vec<Signature>,
    max_entities: u32,
}

impl ComponentStore {
    /// Create an empty store
    pub fn new(config: &EcsConfig) -> Self {
        Self {
            registry: ComponentRegistry::new(config.max_component_types),
            columns: Vec::new(),
            signatures: Vec::new(),
            max_entities: config.max_entities,
        }
    }

    /// The type registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a type by name and size. No typed column is created.
    pub fn register_type(&mut self, name: &str, size: usize) -> EcsResult<ComponentTypeInfo> {
        let info = self.registry.register_type(name, size)?;
        self.sync_columns();
        Ok(info)
    }

    /// Register a Rust component type and create its column
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentTypeInfo> {
        let info = self.registry.register::<T>()?;
        self.sync_columns();
        let slot = &mut self.columns[info.index as usize];
        if slot.is_none() {
            *slot = Some(Box::new(TypedColumn::<T>::new()));
        }
        Ok(info)
    }

    fn sync_columns(&mut self) {
        if self.columns.len() < self.registry.len() {
            self.columns.resize_with(self.registry.len(), || None);
        }
    }

    fn unregistered<T: Component>() -> EcsError {
        EcsError::UnregisteredComponentType(short_type_name::<T>().to_string())
    }

    fn column<T: Component>(&self) -> EcsResult<&TypedColumn<T>> {
        let index = self.registry.index_of::<T>().ok_or_else(Self::unregistered::<T>)?;
        self.columns
            .get(index as usize)
            .and_then(Option::as_ref)
            .and_then(|column| column.as_any().downcast_ref::<TypedColumn<T>>())
            .ok_or_else(Self::unregistered::<T>)
    }

    fn column_mut<T: Component>(&mut self) -> EcsResult<(u32, &mut TypedColumn<T>)> {
        let index = self.registry.index_of::<T>().ok_or_else(Self::unregistered::<T>)?;
        let column = self
            .columns
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .and_then(|column| column.as_any_mut().downcast_mut::<TypedColumn<T>>())
            .ok_or_else(Self::unregistered::<T>)?;
        Ok((index, column))
    }

    fn check_entity(&self, entity: Entity) -> EcsResult<()> {
        if entity.id() >= self.max_entities {
            return Err(EcsError::EntityOutOfRange(entity));
        }
        Ok(())
    }

    /// Attach a component, replacing any existing instance of the same type
    pub fn set_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.check_entity(entity)?;
        let (index, column) = self.column_mut::<T>()?;
        column.insert(entity, component);

        let slot = entity.index();
        if self.signatures.len() <= slot {
            self.signatures.resize_with(slot + 1, Signature::new);
        }
        self.signatures[slot].insert(index);
        Ok(())
    }

    /// Get a component that the entity is expected to have
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.column::<T>()?
            .get(entity)
            .ok_or_else(|| EcsError::MissingComponent {
                entity,
                component: short_type_name::<T>().to_string(),
            })
    }

    /// Mutable access to a component that the entity is expected to have
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let (_, column) = self.column_mut::<T>()?;
        column.get_mut(entity).ok_or_else(|| EcsError::MissingComponent {
            entity,
            component: short_type_name::<T>().to_string(),
        })
    }

    /// Component, if the entity has one
    pub fn find_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.column::<T>().ok()?.get(entity)
    }

    /// Mutable component, if the entity has one
    pub fn find_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let (_, column) = self.column_mut::<T>().ok()?;
        column.get_mut(entity)
    }

    /// Detach a component and hand back the instance, if there was one
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<Option<T>> {
        let (index, column) = self.column_mut::<T>()?;
        let removed = column.take(entity);
        if let Some(signature) = self.signatures.get_mut(entity.index()) {
            signature.remove(index);
        }
        Ok(removed)
    }

    /// Detach whatever component occupies `index`
    pub fn remove_component_index(&mut self, entity: Entity, index: u32) -> bool {
        let removed = self
            .columns
            .get_mut(index as usize)
            .and_then(Option::as_mut)
            .is_some_and(|column| column.remove(entity));
        if let Some(signature) = self.signatures.get_mut(entity.index()) {
            signature.remove(index);
        }
        removed
    }

    /// Detach every component from an entity
    pub fn remove_all_components(&mut self, entity: Entity) {
        for column in self.columns.iter_mut().flatten() {
            column.remove(entity);
        }
        if let Some(signature) = self.signatures.get_mut(entity.index()) {
            signature.clear();
        }
    }

    /// Check if an entity has a component type
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.registry
            .index_of::<T>()
            .is_some_and(|index| self.has_component_index(entity, index))
    }

    /// Check if an entity has the component at `index`
    pub fn has_component_index(&self, entity: Entity, index: u32) -> bool {
        self.signatures
            .get(entity.index())
            .is_some_and(|signature| signature.contains(index))
    }

    /// Signature of every component currently attached to an entity
    pub fn signature(&self, entity: Entity) -> Signature {
        self.signatures
            .get(entity.index())
            .cloned()
            .unwrap_or_default()
    }
}
