//! Event system that executes operations immediately

use std::collections::HashMap;

use super::{Event, EventData, EventQueue, EventSink, Listener};

/// Event system that immediately executes given operations
///
/// Listeners only ever see `&Event`, so they cannot reach this system while it
/// is dispatching. Anything they need to change goes through the queue handed
/// to them with the event.
pub struct DirectEventSystem {
    events: HashMap<String, Vec<Listener>>,
    queue: EventQueue,
}

impl DirectEventSystem {
    /// Create an event system with its own queue
    pub fn new() -> Self {
        Self::with_queue(EventQueue::new())
    }

    /// Create an event system whose events expose `queue` to listeners
    pub fn with_queue(queue: EventQueue) -> Self {
        Self {
            events: HashMap::new(),
            queue,
        }
    }

    /// Queue exposed to listeners
    pub const fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Number of listeners registered for an event
    pub fn listener_count(&self, name: &str) -> usize {
        self.events.get(name).map_or(0, Vec::len)
    }

    /// Whether any listener is registered for an event
    pub fn has_listeners(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }
}

impl Default for DirectEventSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for DirectEventSystem {
    fn add_listener(&mut self, name: &str, listener: Listener) {
        self.events
            .entry(name.to_string())
            .or_default()
            .push(listener);
    }

    fn remove_listeners(&mut self, name: &str) {
        self.events.remove(name);
    }

    fn remove_listener(&mut self, name: &str, listener: &Listener) {
        if let Some(listeners) = self.events.get_mut(name) {
            if let Some(index) = listeners.iter().position(|candidate| candidate == listener) {
                listeners.remove(index);
            }

            if listeners.is_empty() {
                self.events.remove(name);
            }
        }
    }

    fn remove_listener_everywhere(&mut self, listener: &Listener) {
        for listeners in self.events.values_mut() {
            listeners.retain(|candidate| candidate != listener);
        }

        self.events.retain(|_, listeners| !listeners.is_empty());
    }

    fn remove_all_listeners(&mut self) {
        self.events.clear();
    }

    fn dispatch_event(&mut self, name: &str, data: EventData) {
        if let Some(listeners) = self.events.get(name) {
            let event = Event::new(name, &data, &self.queue);

            for listener in listeners {
                listener.invoke(&event);
            }
        }
    }
}
