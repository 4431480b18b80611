//! Entity system errors

use thiserror::Error;

use super::keyvalues::KeyValueError;

/// Errors building the entity system metadata
///
/// All of these are content or programming defects found at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaDataError {
    /// A component field uses a type with no converter
    #[error("component {component} keyvalue \"{key}\" has type {type_name}, which has no keyvalue converter")]
    NoConverter {
        /// Component type name
        component: &'static str,
        /// Keyvalue name
        key: String,
        /// Field type name
        type_name: &'static str,
    },

    /// A component declares the same keyvalue twice
    #[error("component {component} declares keyvalue \"{key}\" more than once")]
    DuplicateKeyValue {
        /// Component type name
        component: &'static str,
        /// Keyvalue name
        key: String,
    },

    /// A factory requires a component that was never registered
    #[error("entity class \"{class_name}\" requires unregistered component {component}")]
    UnregisteredComponent {
        /// Entity class name
        class_name: String,
        /// Component type name
        component: &'static str,
    },

    /// A factory was registered with an empty class name
    #[error("invalid entity class name \"{0}\"")]
    InvalidClassName(String),

    /// Converter configuration error
    #[error(transparent)]
    KeyValue(#[from] KeyValueError),
}

/// Errors creating a single entity
///
/// These affect one entity only; callers loading many entities log them and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// No factory is registered for the class name
    #[error("no entity factory for class \"{0}\"")]
    UnknownClass(String),

    /// A component refused initialization
    #[error("entity of class \"{0}\" failed to initialize")]
    InitializationFailed(String),

    /// The entity requested its own destruction while initializing
    #[error("entity of class \"{0}\" was destroyed during initialization")]
    DestroyedDuringInitialization(String),

    /// The scene holds its maximum number of entities
    #[error("entity limit of {0} reached")]
    Capacity(usize),

    /// Entity block without a classname
    #[error("entity {0} has no classname")]
    MissingClassName(usize),
}

/// Errors scheduling or running a component method
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The entity is not in the scene
    #[error("entity is not in the scene")]
    UnknownEntity,

    /// The entity has no component of the requested type
    #[error("entity has no component {0}")]
    MissingComponent(&'static str),

    /// The component declares no method with that name
    #[error("component {component} has no method \"{method}\"")]
    UnknownMethod {
        /// Component type name
        component: &'static str,
        /// Requested method
        method: String,
    },

    /// Delay too small to make progress
    #[error("invocation delay {0} must be greater than 0.0001")]
    InvalidDelay(f32),

    /// Repeat interval too small to make progress
    #[error("invocation interval {0} must be greater than 0.0001")]
    InvalidInterval(f32),
}
