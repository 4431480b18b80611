//! Component runtime
//!
//! While a scene runs, every enabled component is updated once per
//! [`Scene::update`](super::Scene::update). The first update of a component
//! is preceded by [`Component::start`](super::Component::start).
//!
//! Components can also ask for one of their declared methods to be called
//! later, once or repeatedly. Pending calls live in an [`InvocationQueue`]
//! and are dropped when the component is disabled or its entity destroyed.

use super::component::ComponentMetaData;
use super::entity::{EntityFlags, EntityId};
use super::keyvalues::TypeKey;
use super::ScheduleError;

/// Delays and repeat intervals must be greater than this, in seconds
pub const MIN_INVOCATION_DELAY: f32 = 0.0001;

/// A pending method call
#[derive(Debug, Clone, Copy)]
pub struct Invocation {
    entity: EntityId,
    component: TypeKey,
    method: &'static str,
    time: f32,
    interval: Option<f32>,
}

impl Invocation {
    /// Entity owning the component
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Component the method belongs to
    pub const fn component(&self) -> TypeKey {
        self.component
    }

    /// Method name
    pub const fn method(&self) -> &'static str {
        self.method
    }

    /// Scene time at which the call is due
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Repeat interval, if the call repeats
    pub const fn interval(&self) -> Option<f32> {
        self.interval
    }
}

/// Pending method calls in scheduling order
#[derive(Debug, Default)]
pub struct InvocationQueue {
    entries: Vec<(u64, Invocation)>,
    next_handle: u64,
}

impl InvocationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a call of one of the component's methods
    ///
    /// `interval` makes the call repeat after its first run.
    pub fn schedule(
        &mut self,
        entity: EntityId,
        metadata: &ComponentMetaData,
        method: &str,
        now: f32,
        delay: f32,
        interval: Option<f32>,
    ) -> Result<(), ScheduleError> {
        if delay <= MIN_INVOCATION_DELAY {
            return Err(ScheduleError::InvalidDelay(delay));
        }

        if let Some(interval) = interval.filter(|interval| *interval <= MIN_INVOCATION_DELAY) {
            return Err(ScheduleError::InvalidInterval(interval));
        }

        let binding = metadata.method(method).ok_or_else(|| ScheduleError::UnknownMethod {
            component: metadata.component_type().name(),
            method: method.to_string(),
        })?;

        let handle = self.next_handle;
        self.next_handle += 1;

        self.entries.push((
            handle,
            Invocation {
                entity,
                component: metadata.component_type(),
                method: binding.name(),
                time: now + delay,
                interval,
            },
        ));

        Ok(())
    }

    /// Drop every pending call of a component
    pub fn cancel(&mut self, entity: EntityId, component: TypeKey) {
        self.entries
            .retain(|(_, invocation)| !(invocation.entity == entity && invocation.component == component));
    }

    /// Drop the pending calls of one method of a component
    pub fn cancel_method(&mut self, entity: EntityId, component: TypeKey, method: &str) {
        self.entries.retain(|(_, invocation)| {
            !(invocation.entity == entity && invocation.component == component && invocation.method == method)
        });
    }

    /// Drop every pending call on an entity
    pub fn cancel_entity(&mut self, entity: EntityId) {
        self.entries.retain(|(_, invocation)| invocation.entity != entity);
    }

    /// Whether a method of the component has a pending call
    pub fn is_scheduled(&self, entity: EntityId, component: TypeKey, method: &str) -> bool {
        self.entries.iter().any(|(_, invocation)| {
            invocation.entity == entity && invocation.component == component && invocation.method == method
        })
    }

    /// Pending calls in scheduling order
    pub fn iter(&self) -> impl Iterator<Item = &Invocation> {
        self.entries.iter().map(|(_, invocation)| invocation)
    }

    /// Number of pending calls
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles of the calls due at `now`, in scheduling order
    pub(crate) fn due(&self, now: f32) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|(_, invocation)| invocation.time <= now)
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// A call that has not been cancelled
    pub(crate) fn get(&self, handle: u64) -> Option<Invocation> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == handle)
            .map(|(_, invocation)| *invocation)
    }

    /// Reschedule a repeating call after it ran, or drop a one-shot call
    pub(crate) fn complete(&mut self, handle: u64, now: f32) {
        let Some(index) = self.entries.iter().position(|(candidate, _)| *candidate == handle) else {
            // Cancelled while running
            return;
        };

        match self.entries[index].1.interval {
            Some(interval) => self.entries[index].1.time = now + interval,
            None => {
                self.entries.remove(index);
            }
        }
    }
}

/// What a component can reach while updating or running a method
pub struct UpdateContext<'a> {
    entity: EntityId,
    class_name: &'a str,
    metadata: &'a ComponentMetaData,
    time: f32,
    flags: &'a mut EntityFlags,
    invocations: &'a mut InvocationQueue,
    disable_requested: bool,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        entity: EntityId,
        class_name: &'a str,
        metadata: &'a ComponentMetaData,
        time: f32,
        flags: &'a mut EntityFlags,
        invocations: &'a mut InvocationQueue,
    ) -> Self {
        Self {
            entity,
            class_name,
            metadata,
            time,
            flags,
            invocations,
            disable_requested: false,
        }
    }

    /// Entity owning the component
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Class name of the entity
    pub const fn class_name(&self) -> &str {
        self.class_name
    }

    /// Current scene time in seconds
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Call one of this component's methods after `delay` seconds
    pub fn invoke(&mut self, method: &str, delay: f32) -> Result<(), ScheduleError> {
        self.invocations
            .schedule(self.entity, self.metadata, method, self.time, delay, None)
    }

    /// Call one of this component's methods after `delay` seconds, then every `interval` seconds
    pub fn invoke_repeating(&mut self, method: &str, delay: f32, interval: f32) -> Result<(), ScheduleError> {
        self.invocations
            .schedule(self.entity, self.metadata, method, self.time, delay, Some(interval))
    }

    /// Whether one of this component's methods has a pending call
    pub fn is_invoking(&self, method: &str) -> bool {
        self.invocations
            .is_scheduled(self.entity, self.metadata.component_type(), method)
    }

    /// Drop every pending call of this component
    pub fn cancel_invocations(&mut self) {
        self.invocations.cancel(self.entity, self.metadata.component_type());
    }

    /// Drop the pending calls of one method
    pub fn cancel_invocation(&mut self, method: &str) {
        self.invocations
            .cancel_method(self.entity, self.metadata.component_type(), method);
    }

    /// Disable this component once the current call returns
    pub fn disable(&mut self) {
        self.disable_requested = true;
    }

    pub(crate) const fn disable_requested(&self) -> bool {
        self.disable_requested
    }

    /// Mark the entity for destruction; it is removed at the end of the update
    pub fn request_destruction(&mut self) {
        self.flags.insert(EntityFlags::PENDING_DESTRUCTION);
    }

    /// Whether destruction has been requested
    pub const fn is_pending_destruction(&self) -> bool {
        self.flags.contains(EntityFlags::PENDING_DESTRUCTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Component, ComponentRegistryBuilder, KeyValueFields};
    use crate::ecs::keyvalues::KeyValueConvertersBuilder;
    use slotmap::SlotMap;

    #[derive(Default)]
    struct Beacon;

    impl Beacon {
        fn pulse(&mut self, _context: &mut UpdateContext<'_>) {}
    }

    impl Component for Beacon {
        fn describe(fields: &mut KeyValueFields<Self>) {
            fields.method("pulse", Self::pulse);
        }
    }

    fn beacon_metadata() -> ComponentMetaData {
        let mut builder = ComponentRegistryBuilder::new();
        builder.add::<Beacon>();
        let registry = builder.build(&KeyValueConvertersBuilder::new().build()).unwrap();
        registry.get(TypeKey::of::<Beacon>()).unwrap().clone()
    }

    fn entity_ids(count: usize) -> Vec<EntityId> {
        let mut ids = SlotMap::<EntityId, ()>::with_key();
        (0..count).map(|_| ids.insert(())).collect()
    }

    #[test]
    fn test_schedule_validates() {
        let metadata = beacon_metadata();
        let entity = entity_ids(1)[0];
        let mut queue = InvocationQueue::new();

        assert_eq!(
            queue.schedule(entity, &metadata, "pulse", 0.0, 0.0, None),
            Err(ScheduleError::InvalidDelay(0.0))
        );
        assert_eq!(
            queue.schedule(entity, &metadata, "pulse", 0.0, 1.0, Some(0.0)),
            Err(ScheduleError::InvalidInterval(0.0))
        );
        assert!(matches!(
            queue.schedule(entity, &metadata, "Pulse", 0.0, 1.0, None),
            Err(ScheduleError::UnknownMethod { .. })
        ));
        assert!(queue.is_empty());

        queue.schedule(entity, &metadata, "pulse", 2.0, 0.5, None).unwrap();
        let invocation = queue.iter().next().unwrap();
        approx::assert_relative_eq!(invocation.time(), 2.5);
        assert_eq!(invocation.method(), "pulse");
        assert_eq!(invocation.interval(), None);
    }

    #[test]
    fn test_due_and_complete() {
        let metadata = beacon_metadata();
        let entity = entity_ids(1)[0];
        let mut queue = InvocationQueue::new();

        queue.schedule(entity, &metadata, "pulse", 0.0, 1.0, None).unwrap();
        queue.schedule(entity, &metadata, "pulse", 0.0, 1.0, Some(2.0)).unwrap();
        queue.schedule(entity, &metadata, "pulse", 0.0, 5.0, None).unwrap();

        assert!(queue.due(0.5).is_empty());
        let due = queue.due(1.0);
        assert_eq!(due.len(), 2);

        for handle in due {
            queue.complete(handle, 1.0);
        }

        // The one-shot call is gone, the repeating one moved on
        assert_eq!(queue.len(), 2);
        let times: Vec<f32> = queue.iter().map(Invocation::time).collect();
        approx::assert_relative_eq!(times[0], 3.0);
        approx::assert_relative_eq!(times[1], 5.0);
    }

    #[test]
    fn test_cancel() {
        let metadata = beacon_metadata();
        let ids = entity_ids(2);
        let beacon = TypeKey::of::<Beacon>();
        let mut queue = InvocationQueue::new();

        queue.schedule(ids[0], &metadata, "pulse", 0.0, 1.0, None).unwrap();
        queue.schedule(ids[1], &metadata, "pulse", 0.0, 1.0, None).unwrap();
        assert!(queue.is_scheduled(ids[0], beacon, "pulse"));

        queue.cancel_method(ids[0], beacon, "pulse");
        assert!(!queue.is_scheduled(ids[0], beacon, "pulse"));
        assert!(queue.is_scheduled(ids[1], beacon, "pulse"));

        let handle = queue.due(1.0)[0];
        queue.cancel_entity(ids[1]);
        assert!(queue.is_empty());
        assert!(queue.get(handle).is_none());

        // Completing a cancelled call is a no-op
        queue.complete(handle, 1.0);
        assert!(queue.is_empty());
    }
}
