//! Entity composition
//!
//! Entities are built from map keyvalues:
//! - [`keyvalues`] converts strings to typed values
//! - [`Component`]s declare the keyvalues they read and validate themselves
//! - [`EntityFactory`]s name the components of each entity class
//! - [`EntityCreator`] runs the factory and hands back the entity only if
//!   every component accepted its keyvalues
//! - [`Scene`] holds the entities that made it and drives their components
//!   through the [`runtime`]

pub mod keyvalues;
pub mod component;
pub mod components;
pub mod creator;
pub mod entity;
pub mod factory;
pub mod metadata;
pub mod network;
pub mod runtime;
pub mod world;

mod error;

#[cfg(test)]
mod tests;

pub use component::{
    AsAny, Component, ComponentMetaData, ComponentRegistry, ComponentRegistryBuilder, FieldBinding, InitContext,
    KeyValueFields, MethodBinding, SpawnFlagBinding,
};
pub use creator::EntityCreator;
pub use entity::{Entity, EntityFlags, EntityId};
pub use error::{EntityError, MetaDataError, ScheduleError};
pub use factory::{ComponentListFactory, ComponentTypeSet, EntityDictionary, EntityDictionaryBuilder, EntityFactory};
pub use metadata::{EntitySystemMetaData, EntitySystemMetaDataBuilder};
pub use network::{NetworkHook, NetworkObject};
pub use runtime::{Invocation, InvocationQueue, UpdateContext, MIN_INVOCATION_DELAY};
pub use world::{LoadReport, Scene};
