//! Event system facade

use super::{DirectEventSystem, EventData, EventQueue, EventSink, Listener};

/// The event system allows named events to be dispatched to listeners that want to know about them
///
/// Listeners cannot add or remove listeners or dispatch further events while a
/// dispatch is ongoing; they queue the operation through [`Event::queue`](super::Event::queue)
/// instead, and the queue is drained once the outermost dispatch returns.
pub struct EventSystem {
    direct: DirectEventSystem,
    queue: EventQueue,
}

impl EventSystem {
    /// Create an empty event system
    pub fn new() -> Self {
        let queue = EventQueue::new();

        Self {
            direct: DirectEventSystem::with_queue(queue.clone()),
            queue,
        }
    }

    /// Queue feeding this event system
    ///
    /// Producers that cannot borrow the event system hold a clone of this handle.
    pub const fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Number of listeners registered for an event
    pub fn listener_count(&self, name: &str) -> usize {
        self.direct.listener_count(name)
    }

    /// Apply all queued operations
    ///
    /// Returns the number of operations applied.
    pub fn flush(&mut self) -> usize {
        self.queue.drain_into(&mut self.direct)
    }

    fn is_valid_name(name: &str) -> bool {
        if name.trim().is_empty() {
            log::warn!("Ignoring event operation with an empty event name");
            return false;
        }

        true
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventSystem {
    fn add_listener(&mut self, name: &str, listener: Listener) {
        if Self::is_valid_name(name) {
            self.direct.add_listener(name, listener);
        }
    }

    fn remove_listeners(&mut self, name: &str) {
        if Self::is_valid_name(name) {
            self.direct.remove_listeners(name);
        }
    }

    fn remove_listener(&mut self, name: &str, listener: &Listener) {
        if Self::is_valid_name(name) {
            self.direct.remove_listener(name, listener);
        }
    }

    fn remove_listener_everywhere(&mut self, listener: &Listener) {
        self.direct.remove_listener_everywhere(listener);
    }

    fn remove_all_listeners(&mut self) {
        self.direct.remove_all_listeners();
    }

    /// Dispatch an event, then apply everything its listeners queued
    fn dispatch_event(&mut self, name: &str, data: EventData) {
        if !Self::is_valid_name(name) {
            return;
        }

        self.direct.dispatch_event(name, data);
        self.flush();
    }
}
