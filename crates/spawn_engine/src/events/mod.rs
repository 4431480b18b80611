//! Named event dispatch with deferred operations
//!
//! Key principles:
//! - Events are identified by name and carry optional type-erased data
//! - Listeners are shared closures compared by identity
//! - Every operation (dispatch, add/remove listener) can be captured as a record
//!   and applied later, in submission order, through [`EventQueue`]
//! - [`EventSystem`] defers everything raised during a dispatch until that
//!   dispatch has returned

mod direct;
mod queue;
mod system;

pub use direct::DirectEventSystem;
pub use queue::{EventQueue, Operation};
pub use system::EventSystem;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Data attached to a dispatched event
pub type EventData = Option<Arc<dyn Any + Send + Sync>>;

/// An event as seen by a listener
pub struct Event<'a> {
    name: &'a str,
    data: &'a EventData,
    queue: &'a EventQueue,
}

impl<'a> Event<'a> {
    pub(crate) const fn new(name: &'a str, data: &'a EventData, queue: &'a EventQueue) -> Self {
        Self { name, data, queue }
    }

    /// Event name
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Event data, if present and of type `T`
    pub fn data<T: Any>(&self) -> Option<&'a T> {
        self.data.as_deref().and_then(|data| data.downcast_ref::<T>())
    }

    /// Raw event data
    pub const fn raw_data(&self) -> &'a EventData {
        self.data
    }

    /// Queue of the event system that dispatched this event
    ///
    /// Operations pushed here are applied after the current dispatch returns.
    pub const fn queue(&self) -> &'a EventQueue {
        self.queue
    }
}

/// Event listener
///
/// Cloning a listener shares the underlying closure; two listeners are equal
/// only if they share it.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&Event<'_>) + Send + Sync>);

impl Listener {
    /// Wrap a closure as a listener
    pub fn new(handler: impl Fn(&Event<'_>) + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Invoke the listener
    pub fn invoke(&self, event: &Event<'_>) {
        (self.0)(event);
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.address()).finish()
    }
}

/// Target of event operations
///
/// Implemented by the live [`DirectEventSystem`] and by [`EventQueue`], which
/// records each call instead of performing it.
pub trait EventSink {
    /// Add a listener for a specific event
    fn add_listener(&mut self, name: &str, listener: Listener);

    /// Remove all listeners of a specific event
    fn remove_listeners(&mut self, name: &str);

    /// Remove a listener from a specific event
    ///
    /// Removing a listener that is not registered does nothing.
    fn remove_listener(&mut self, name: &str, listener: &Listener);

    /// Remove a listener from every event it is listening to
    fn remove_listener_everywhere(&mut self, listener: &Listener);

    /// Remove all listeners
    fn remove_all_listeners(&mut self);

    /// Dispatch an event to all listeners of that event
    fn dispatch_event(&mut self, name: &str, data: EventData);
}
