//! Collider component
//!
//! Declares the collision volume of an entity. Collision itself is resolved
//! elsewhere.

use crate::ecs::component::{Component, InitContext, KeyValueFields};
use crate::foundation::math::{all_le, Vec3};
use crate::key_value_enum;

key_value_enum! {
    /// How other entities collide with this one
    #[derive(Default)]
    pub enum Solid {
        /// No interaction
        #[default]
        Not = 0,
        /// Touch only, no blocking
        Trigger = 1,
        /// Touch and block, bounding box
        BBox = 2,
        /// Touch and block, bounding box, sliding on the ground
        SlideBox = 3,
        /// Brush model collision
        Bsp = 4,
    }
}

/// Axis aligned collision bounds relative to the origin
#[derive(Debug, Clone, Default)]
pub struct Collider {
    solid: Solid,
    mins: Vec3,
    maxs: Vec3,
}

impl Collider {
    /// Collision type
    pub const fn solid(&self) -> Solid {
        self.solid
    }

    /// Lower corner
    pub const fn mins(&self) -> &Vec3 {
        &self.mins
    }

    /// Upper corner
    pub const fn maxs(&self) -> &Vec3 {
        &self.maxs
    }

    /// Size of the bounds
    pub fn size(&self) -> Vec3 {
        self.maxs - self.mins
    }
}

impl Component for Collider {
    fn describe(fields: &mut KeyValueFields<Self>) {
        fields
            .field("solid", |collider: &mut Self, value: Solid| collider.solid = value)
            .required("mins", |collider: &mut Self, value: Vec3| collider.mins = value)
            .required("maxs", |collider: &mut Self, value: Vec3| collider.maxs = value);
    }

    fn initialize(&mut self, context: &mut InitContext<'_>) -> bool {
        if !all_le(&self.mins, &self.maxs) {
            log::warn!(
                "{}: invalid bounds mins {:?} maxs {:?}",
                context.class_name(),
                self.mins,
                self.maxs
            );
            return false;
        }

        true
    }
}
