//! Replication hook

use std::fmt;
use std::sync::Arc;

/// Receives field change notifications for a networked entity
pub trait NetworkObject: Send + Sync {
    /// A field of a component of the entity changed
    fn on_change(&self, field: &str);
}

/// Handle components use to report changed fields
///
/// Notifications are dropped when the entity is not networked.
#[derive(Clone, Default)]
pub struct NetworkHook(Option<Arc<dyn NetworkObject>>);

impl NetworkHook {
    /// Hook forwarding to a network object
    pub fn new(object: Arc<dyn NetworkObject>) -> Self {
        Self(Some(object))
    }

    /// Whether a network object is attached
    pub const fn is_networked(&self) -> bool {
        self.0.is_some()
    }

    /// Report a changed field
    pub fn notify(&self, field: &str) {
        if let Some(object) = &self.0 {
            object.on_change(field);
        }
    }
}

impl From<Option<Arc<dyn NetworkObject>>> for NetworkHook {
    fn from(object: Option<Arc<dyn NetworkObject>>) -> Self {
        Self(object)
    }
}

impl fmt::Debug for NetworkHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkHook")
            .field("networked", &self.is_networked())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every changed field
    #[derive(Default)]
    pub(crate) struct RecordingNetworkObject {
        pub(crate) changes: Mutex<Vec<String>>,
    }

    impl NetworkObject for RecordingNetworkObject {
        fn on_change(&self, field: &str) {
            self.changes.lock().unwrap().push(field.to_string());
        }
    }

    #[test]
    fn test_notify_without_object_is_skipped() {
        let hook = NetworkHook::default();
        assert!(!hook.is_networked());
        hook.notify("origin");
    }

    #[test]
    fn test_notify_forwards_field() {
        let object = Arc::new(RecordingNetworkObject::default());
        let hook = NetworkHook::new(object.clone());

        hook.notify("origin");
        hook.notify("angles");

        assert_eq!(*object.changes.lock().unwrap(), vec!["origin", "angles"]);
    }
}
