//! # Spawn Engine
//!
//! Entity composition and deferred event dispatch for a component-based game engine.
//!
//! ## Features
//!
//! - **Key-Value Conversion**: Typed converters turn map strings into component field values
//! - **Component Composition**: Entity factories declare component sets per classname
//! - **Fail-Fast Construction**: Entities whose components refuse initialization never go live
//! - **Deferred Events**: An ordered operation queue decouples event producers from dispatch
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spawn_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metadata = EntitySystemMetaDataBuilder::new().with_builtins()?.build()?;
//!
//!     let mut models = ModelCatalog::new();
//!     models.add("models/barney.mdl");
//!
//!     let mut scene = Scene::new(metadata.into(), Box::new(models), SceneConfig::default());
//!     let report = scene.load_entities(r#"{ "classname" "info_target" "origin" "0 0 64" }"#)?;
//!     assert_eq!(report.spawned, 1);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod events;
pub mod ecs;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{Model, ModelCatalog, ModelKind, ModelLoader, ModelManager},
        config::{Config, ConfigError, SceneConfig},
        ecs::{
            Component, ComponentListFactory, ComponentTypeSet, Entity, EntityCreator, EntityError,
            EntityFactory, EntityId, EntitySystemMetaData, EntitySystemMetaDataBuilder,
            InitContext, KeyValueFields, MetaDataError, NetworkObject, Scene, ScheduleError, UpdateContext,
            keyvalues::{KeyValueConverter, KeyValueConverters, KeyValueEnum, KeyValueError, KeyValues, TypeKey},
        },
        events::{Event, EventData, EventQueue, EventSink, EventSystem, Listener},
        foundation::math::Vec3,
    };
}
