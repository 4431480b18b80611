//! Scenes: the live entity list
//!
//! A [`Scene`] owns the entities that made it through creation, the model
//! cache they were created with and the event system that announces their
//! arrival and departure. While running it drives the component runtime.

use std::sync::Arc;

use slotmap::SlotMap;

use super::component::Component;
use super::creator::EntityCreator;
use super::entity::{Entity, EntityId};
use super::keyvalues::parser::{parse_entities, ParseError};
use super::keyvalues::{KeyValues, TypeKey};
use super::metadata::EntitySystemMetaData;
use super::runtime::InvocationQueue;
use super::{EntityError, ScheduleError};
use crate::assets::{ModelLoader, ModelManager};
use crate::config::SceneConfig;
use crate::events::EventSystem;

/// Event dispatched after an entity goes live; data is its [`EntityId`]
pub const ENTITY_SPAWNED_EVENT: &str = "entity_spawned";

/// Event dispatched after an entity is removed; data is its [`EntityId`]
pub const ENTITY_DESTROYED_EVENT: &str = "entity_destroyed";

/// Keyvalue naming the entity class
pub const CLASSNAME_KEY: &str = "classname";

/// Outcome of loading an entity list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entities that went live
    pub spawned: usize,
    /// Entities that were discarded
    pub failed: usize,
}

/// The live entities of a map
pub struct Scene {
    metadata: Arc<EntitySystemMetaData>,
    config: SceneConfig,
    entities: SlotMap<EntityId, Entity>,
    models: ModelManager,
    events: EventSystem,
    invocations: InvocationQueue,
    time: f32,
    running: bool,
}

impl Scene {
    /// Create an empty, stopped scene
    pub fn new(metadata: Arc<EntitySystemMetaData>, loader: Box<dyn ModelLoader>, config: SceneConfig) -> Self {
        let mut models = ModelManager::new(loader);

        if let Some(fallback) = &config.fallback_model {
            if let Err(error) = models.load_fallback(fallback) {
                log::warn!("Couldn't load fallback model: {}", error);
            }
        }

        Self {
            metadata,
            config,
            entities: SlotMap::with_key(),
            models,
            events: EventSystem::new(),
            invocations: InvocationQueue::new(),
            time: 0.0,
            running: false,
        }
    }

    /// Entity system metadata
    pub fn metadata(&self) -> &EntitySystemMetaData {
        &self.metadata
    }

    /// Scene configuration
    pub const fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Model cache
    pub const fn models(&self) -> &ModelManager {
        &self.models
    }

    /// Event system
    pub const fn events(&self) -> &EventSystem {
        &self.events
    }

    /// Mutable event system
    pub fn events_mut(&mut self) -> &mut EventSystem {
        &mut self.events
    }

    /// Apply queued event operations
    pub fn flush_events(&mut self) -> usize {
        self.events.flush()
    }

    /// Create an entity and add it to the scene
    ///
    /// On failure nothing is added. In a running scene the entity is
    /// activated immediately.
    pub fn try_create_entity(&mut self, class_name: &str, key_values: &KeyValues) -> Result<EntityId, EntityError> {
        if let Some(max_entities) = self.config.max_entities {
            if self.entities.len() >= max_entities {
                return Err(EntityError::Capacity(max_entities));
            }
        }

        let mut creator = EntityCreator::new(&self.metadata, &mut self.models);
        let entity = creator.create_entity(class_name, key_values)?;

        let id = self.entities.insert(entity);

        if let Some(entity) = self.entities.get_mut(id) {
            entity.enter_scene();
            if self.running {
                entity.activate();
            }
        }

        self.events
            .queue()
            .dispatch_event(ENTITY_SPAWNED_EVENT, Some(Arc::new(id)));

        Ok(id)
    }

    /// Create every entity described by an entity lump
    ///
    /// Entities that fail are logged and skipped. Only a syntax error in the
    /// lump itself aborts the load.
    pub fn load_entities(&mut self, source: &str) -> Result<LoadReport, ParseError> {
        let entities = parse_entities(source)?;
        Ok(self.spawn_all(entities.iter()))
    }

    /// Create every entity in a list of keyvalue blocks
    pub fn spawn_all<'k>(&mut self, entities: impl IntoIterator<Item = &'k KeyValues>) -> LoadReport {
        let mut report = LoadReport::default();

        for (index, key_values) in entities.into_iter().enumerate() {
            let result = key_values
                .get(CLASSNAME_KEY)
                .ok_or(EntityError::MissingClassName(index))
                .and_then(|class_name| self.try_create_entity(class_name, key_values));

            match result {
                Ok(id) => {
                    report.spawned += 1;
                    if self.config.log_spawned_entities {
                        if let Some(entity) = self.entities.get(id) {
                            log::info!("Spawned {} ({:?})", entity.class_name(), id);
                        }
                    }
                }
                Err(error) => {
                    report.failed += 1;
                    log::warn!("Entity {} discarded: {}", index, error);
                }
            }
        }

        self.flush_events();

        log::info!("Loaded {} entities, {} failed", report.spawned, report.failed);
        report
    }

    /// Remove an entity
    ///
    /// Its enabled components are disabled and their pending invocations dropped.
    pub fn destroy_entity(&mut self, id: EntityId) -> Option<Entity> {
        let mut entity = self.entities.remove(id)?;

        entity.leave_scene();
        self.invocations.cancel_entity(id);

        self.events
            .queue()
            .dispatch_event(ENTITY_DESTROYED_EVENT, Some(Arc::new(id)));

        Some(entity)
    }

    /// Remove every entity marked for destruction
    ///
    /// Returns the number of entities removed.
    pub fn remove_pending_destruction(&mut self) -> usize {
        let pending: Vec<_> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.is_pending_destruction())
            .map(|(id, _)| id)
            .collect();

        for id in &pending {
            self.destroy_entity(*id);
        }

        pending.len()
    }

    /// Entity by id
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable entity by id
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// First entity with the given target name
    pub fn find_by_target_name(&self, target_name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, entity)| entity.target_name() == Some(target_name))
            .map(|(id, _)| id)
    }

    /// Iterate over live entities
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether the scene is running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Start the scene, activating every entity
    pub fn start(&mut self) {
        if self.running {
            return;
        }

        self.running = true;
        for entity in self.entities.values_mut() {
            entity.activate();
        }

        log::info!("Scene started with {} entities", self.entities.len());
        self.flush_events();
    }

    /// Stop the scene, destroying every entity
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }

        let ids: Vec<_> = self.entities.keys().collect();
        for id in ids {
            self.destroy_entity(id);
        }

        self.running = false;
        self.flush_events();

        log::info!("Scene stopped");
    }

    /// Scene time of the last update, in seconds
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Advance the scene to `time`
    ///
    /// Starts and updates every enabled component, runs the invocations that
    /// are due, removes entities marked for destruction and flushes events.
    /// Does nothing while the scene is stopped.
    pub fn update(&mut self, time: f32) {
        if !self.running {
            log::debug!("Scene update ignored while stopped");
            return;
        }

        self.time = time;

        let metadata = Arc::clone(&self.metadata);
        let registry = metadata.components();

        for (id, entity) in &mut self.entities {
            if !entity.is_pending_destruction() {
                entity.update_components(id, time, registry, &mut self.invocations);
            }
        }

        for handle in self.invocations.due(time) {
            // Earlier calls in this pass may have cancelled it
            let Some(invocation) = self.invocations.get(handle) else {
                continue;
            };

            let method = registry
                .get(invocation.component())
                .and_then(|component| component.method(invocation.method()));

            if let (Some(entity), Some(method)) = (self.entities.get_mut(invocation.entity()), method) {
                if !entity.is_pending_destruction() {
                    entity.call_method(
                        invocation.entity(),
                        registry,
                        invocation.component(),
                        method,
                        time,
                        &mut self.invocations,
                    );
                }
            }

            self.invocations.complete(handle, time);
        }

        self.remove_pending_destruction();
        self.flush_events();
    }

    /// Enable or disable a component of an entity
    ///
    /// Disabling drops the component's pending invocations. Returns `false` if
    /// the entity or component doesn't exist or already had that state.
    pub fn set_component_enabled<C: Component>(&mut self, id: EntityId, enabled: bool) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };

        let changed = entity.set_enabled(TypeKey::of::<C>(), enabled);

        if changed && !enabled {
            self.invocations.cancel(id, TypeKey::of::<C>());
        }

        changed
    }

    /// Call a component method right away
    pub fn invoke_now<C: Component>(&mut self, id: EntityId, method: &str) -> Result<(), ScheduleError> {
        let component = TypeKey::of::<C>();
        let registry = self.metadata.components();

        let binding = registry
            .get(component)
            .ok_or_else(|| ScheduleError::MissingComponent(component.name()))?
            .method(method)
            .ok_or_else(|| ScheduleError::UnknownMethod {
                component: component.name(),
                method: method.to_string(),
            })?;

        let entity = self.entities.get_mut(id).ok_or(ScheduleError::UnknownEntity)?;

        if entity.call_method(id, registry, component, binding, self.time, &mut self.invocations) {
            Ok(())
        } else {
            Err(ScheduleError::MissingComponent(component.name()))
        }
    }

    /// Call a component method once after `delay` seconds
    pub fn invoke<C: Component>(&mut self, id: EntityId, method: &str, delay: f32) -> Result<(), ScheduleError> {
        self.schedule::<C>(id, method, delay, None)
    }

    /// Call a component method after `delay` seconds, then every `interval` seconds
    pub fn invoke_repeating<C: Component>(
        &mut self,
        id: EntityId,
        method: &str,
        delay: f32,
        interval: f32,
    ) -> Result<(), ScheduleError> {
        self.schedule::<C>(id, method, delay, Some(interval))
    }

    fn schedule<C: Component>(
        &mut self,
        id: EntityId,
        method: &str,
        delay: f32,
        interval: Option<f32>,
    ) -> Result<(), ScheduleError> {
        let component = TypeKey::of::<C>();
        let entity = self.entities.get(id).ok_or(ScheduleError::UnknownEntity)?;

        let metadata = self
            .metadata
            .components()
            .get(component)
            .filter(|_| entity.has_type(component))
            .ok_or_else(|| ScheduleError::MissingComponent(component.name()))?;

        self.invocations
            .schedule(id, metadata, method, self.time, delay, interval)
    }

    /// Drop every pending invocation of a component
    pub fn cancel_invocations<C: Component>(&mut self, id: EntityId) {
        self.invocations.cancel(id, TypeKey::of::<C>());
    }

    /// Drop the pending invocations of one component method
    pub fn cancel_invocation<C: Component>(&mut self, id: EntityId, method: &str) {
        self.invocations.cancel_method(id, TypeKey::of::<C>(), method);
    }

    /// Pending invocations
    pub const fn invocations(&self) -> &InvocationQueue {
        &self.invocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelCatalog;
    use crate::ecs::components::Transform;
    use crate::ecs::metadata::EntitySystemMetaDataBuilder;
    use crate::events::{EventSink, Listener};
    use crate::foundation::math::Vec3;
    use std::sync::Mutex;

    fn scene(config: SceneConfig) -> Scene {
        let metadata = EntitySystemMetaDataBuilder::new().with_builtins().unwrap().build().unwrap();
        let models: ModelCatalog = ["sprites/glow01.spr", "models/error.mdl"].into_iter().collect();
        Scene::new(Arc::new(metadata), Box::new(models), config)
    }

    #[test]
    fn test_create_and_lookup() {
        let mut scene = scene(SceneConfig::default());

        let key_values = KeyValues::new()
            .with("origin", "1 2 3")
            .with("targetname", "spot");
        let id = scene.try_create_entity("info_target", &key_values).unwrap();

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.find_by_target_name("spot"), Some(id));
        assert_eq!(scene.find_by_target_name("other"), None);

        let transform = scene.entity(id).unwrap().get::<Transform>().unwrap();
        assert_eq!(*transform.origin(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_failed_entity_is_not_added() {
        let mut scene = scene(SceneConfig::default());

        let result = scene.try_create_entity("env_sprite", &KeyValues::new().with("model", "sprites/missing.spr"));

        assert!(matches!(result, Err(EntityError::InitializationFailed(_))));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_fallback_model() {
        let mut scene = scene(SceneConfig::default().with_fallback_model("models/error.mdl"));

        let id = scene
            .try_create_entity("env_sprite", &KeyValues::new().with("model", "sprites/missing.spr"))
            .unwrap();

        let renderable = scene.entity(id).unwrap().get::<crate::ecs::components::Renderable>().unwrap();
        assert_eq!(renderable.model().unwrap().name(), "models/error.mdl");
    }

    #[test]
    fn test_capacity() {
        let mut scene = scene(SceneConfig::default().with_max_entities(1));

        scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        assert_eq!(
            scene.try_create_entity("info_target", &KeyValues::new()),
            Err(EntityError::Capacity(1))
        );
    }

    #[test]
    fn test_start_activates_and_later_entities_activate_on_spawn() {
        let mut scene = scene(SceneConfig::default());

        let before = scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        assert!(!scene.entity(before).unwrap().is_activated());

        scene.start();
        assert!(scene.is_running());
        assert!(scene.entity(before).unwrap().is_activated());

        let after = scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        assert!(scene.entity(after).unwrap().is_activated());

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            scene.events_mut().add_listener(
                ENTITY_DESTROYED_EVENT,
                Listener::new(move |event| seen.lock().unwrap().push(*event.data::<EntityId>().unwrap())),
            );
        }

        scene.stop();
        assert!(!scene.is_running());
        assert!(scene.is_empty());
        assert!(scene.entity(before).is_none());

        let mut destroyed = seen.lock().unwrap().clone();
        destroyed.sort();
        let mut expected = vec![before, after];
        expected.sort();
        assert_eq!(destroyed, expected);
    }

    #[test]
    fn test_spawn_and_destroy_events() {
        let mut scene = scene(SceneConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in [ENTITY_SPAWNED_EVENT, ENTITY_DESTROYED_EVENT] {
            let seen = Arc::clone(&seen);
            scene.events_mut().add_listener(
                name,
                Listener::new(move |event| {
                    let id = *event.data::<EntityId>().unwrap();
                    seen.lock().unwrap().push((event.name().to_string(), id));
                }),
            );
        }

        let id = scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        // Queued until flushed
        assert!(seen.lock().unwrap().is_empty());
        scene.flush_events();

        scene.destroy_entity(id).unwrap();
        assert!(scene.destroy_entity(id).is_none());
        scene.flush_events();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (ENTITY_SPAWNED_EVENT.to_string(), id),
                (ENTITY_DESTROYED_EVENT.to_string(), id)
            ]
        );
    }

    #[test]
    fn test_remove_pending_destruction() {
        let mut scene = scene(SceneConfig::default());

        let keep = scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        let doomed = scene.try_create_entity("info_target", &KeyValues::new()).unwrap();
        scene.entity_mut(doomed).unwrap().mark_for_destruction();

        assert_eq!(scene.remove_pending_destruction(), 1);
        assert!(scene.entity(keep).is_some());
        assert!(scene.entity(doomed).is_none());
    }
}
