//! Transform component
//!
//! Position and motion of an entity in world space. Every setter reports the
//! changed field to the entity's replication hook.

use crate::ecs::component::{Component, InitContext, KeyValueFields};
use crate::ecs::network::NetworkHook;
use crate::foundation::math::Vec3;

/// Position, orientation and motion
#[derive(Debug, Clone)]
pub struct Transform {
    origin: Vec3,
    angles: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    scale: f32,
    network: NetworkHook,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            angles: Vec3::zeros(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            scale: 1.0,
            network: NetworkHook::default(),
        }
    }
}

impl Transform {
    /// World space position
    pub const fn origin(&self) -> &Vec3 {
        &self.origin
    }

    /// Set the position
    pub fn set_origin(&mut self, origin: Vec3) {
        self.origin = origin;
        self.network.notify("origin");
    }

    /// Pitch, yaw and roll in degrees
    pub const fn angles(&self) -> &Vec3 {
        &self.angles
    }

    /// Set the orientation
    pub fn set_angles(&mut self, angles: Vec3) {
        self.angles = angles;
        self.network.notify("angles");
    }

    /// Linear velocity
    pub const fn velocity(&self) -> &Vec3 {
        &self.velocity
    }

    /// Set the linear velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.network.notify("velocity");
    }

    /// Angular velocity in degrees per second
    pub const fn angular_velocity(&self) -> &Vec3 {
        &self.angular_velocity
    }

    /// Set the angular velocity
    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
        self.network.notify("avelocity");
    }

    /// Uniform scale
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the scale
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.network.notify("scale");
    }
}

impl Component for Transform {
    fn describe(fields: &mut KeyValueFields<Self>) {
        // Keyvalues are assigned directly; there is nothing to replicate before spawn
        fields
            .field("origin", |transform: &mut Self, value: Vec3| transform.origin = value)
            .field("angles", |transform: &mut Self, value: Vec3| transform.angles = value)
            .field("velocity", |transform: &mut Self, value: Vec3| transform.velocity = value)
            .field("avelocity", |transform: &mut Self, value: Vec3| transform.angular_velocity = value)
            .field("scale", |transform: &mut Self, value: f32| transform.scale = value);
    }

    fn initialize(&mut self, context: &mut InitContext<'_>) -> bool {
        // A scale of 0 in map data means "unset"
        if self.scale.abs() < f32::EPSILON {
            log::debug!("{}: scale 0 treated as 1", context.class_name());
            self.scale = 1.0;
        }
        true
    }

    fn attach_network(&mut self, hook: NetworkHook) {
        self.network = hook;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ModelCatalog, ModelManager};
    use crate::ecs::entity::EntityFlags;
    use crate::ecs::keyvalues::KeyValues;
    use crate::ecs::network::tests::RecordingNetworkObject;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_default_transform() {
        let transform = Transform::default();
        assert_eq!(*transform.origin(), Vec3::zeros());
        approx::assert_relative_eq!(transform.scale(), 1.0);
    }

    #[test]
    fn test_setters_notify_network() {
        let object = Arc::new(RecordingNetworkObject::default());
        let mut transform = Transform::default();
        transform.attach_network(NetworkHook::new(object.clone()));

        transform.set_origin(Vec3::new(1.0, 2.0, 3.0));
        transform.set_angles(Vec3::new(0.0, 90.0, 0.0));
        transform.set_velocity(Vec3::zeros());
        transform.set_angular_velocity(Vec3::zeros());
        transform.set_scale(2.0);

        assert_eq!(
            *object.changes.lock().unwrap(),
            vec!["origin", "angles", "velocity", "avelocity", "scale"]
        );
        assert_eq!(*transform.origin(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_setters_without_network() {
        let mut transform = Transform::default();
        transform.set_origin(Vec3::new(4.0, 0.0, 0.0));
        approx::assert_relative_eq!(transform.origin().x, 4.0);
    }

    #[test]
    fn test_zero_scale_becomes_one() {
        let mut models = ModelManager::new(Box::new(ModelCatalog::new()));
        let mut flags = EntityFlags::empty();
        let assigned = HashSet::new();
        let key_values = KeyValues::new();
        let mut context = InitContext::new(&key_values, "info_target", &mut models, &mut flags, &assigned);

        let mut transform = Transform::default();
        transform.set_scale(0.0);
        assert!(transform.initialize(&mut context));
        approx::assert_relative_eq!(transform.scale(), 1.0);

        transform.set_scale(0.5);
        assert!(transform.initialize(&mut context));
        approx::assert_relative_eq!(transform.scale(), 0.5);
    }
}
