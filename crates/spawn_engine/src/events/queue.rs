//! Deferred event operations
//!
//! An [`EventQueue`] records every call made on it as an [`Operation`] and
//! replays the records, first in first out, against any [`EventSink`].
//!
//! ## Invariants
//! - Operations are applied in the order they were pushed, exactly once.
//! - The queue never interprets event names or listener identity.
//! - Pushing never fails and may happen from any thread; applying happens on the
//!   thread that owns the sink.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{EventData, EventSink, Listener};

/// A recorded event system call
#[derive(Debug, Clone)]
pub enum Operation {
    /// Dispatch an event
    DispatchEvent {
        /// Event name
        name: String,
        /// Event data
        data: EventData,
    },

    /// Add a listener for an event
    AddListener {
        /// Event name
        name: String,
        /// Listener to add
        listener: Listener,
    },

    /// Remove a listener from an event
    RemoveListener {
        /// Event name
        name: String,
        /// Listener to remove
        listener: Listener,
    },

    /// Remove all listeners of an event
    RemoveListeners {
        /// Event name
        name: String,
    },

    /// Remove a listener from every event
    RemoveListenerEverywhere {
        /// Listener to remove
        listener: Listener,
    },

    /// Remove every listener
    RemoveAllListeners,
}

impl Operation {
    /// Apply this operation to a sink
    pub fn execute<S: EventSink + ?Sized>(self, sink: &mut S) {
        match self {
            Self::DispatchEvent { name, data } => sink.dispatch_event(&name, data),
            Self::AddListener { name, listener } => sink.add_listener(&name, listener),
            Self::RemoveListener { name, listener } => sink.remove_listener(&name, &listener),
            Self::RemoveListeners { name } => sink.remove_listeners(&name),
            Self::RemoveListenerEverywhere { listener } => sink.remove_listener_everywhere(&listener),
            Self::RemoveAllListeners => sink.remove_all_listeners(),
        }
    }
}

/// Shared FIFO buffer of event operations
///
/// Cloning the queue produces another handle to the same buffer.
#[derive(Clone, Default)]
pub struct EventQueue {
    operations: Arc<Mutex<VecDeque<Operation>>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Operation>> {
        // A producer that panicked mid-push cannot leave a half-written record behind
        self.operations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an operation
    pub fn push(&self, operation: Operation) {
        self.lock().push_back(operation);
    }

    /// Queue an event dispatch
    pub fn dispatch_event(&self, name: impl Into<String>, data: EventData) {
        self.push(Operation::DispatchEvent { name: name.into(), data });
    }

    /// Queue a listener addition
    pub fn add_listener(&self, name: impl Into<String>, listener: Listener) {
        self.push(Operation::AddListener { name: name.into(), listener });
    }

    /// Queue a listener removal
    pub fn remove_listener(&self, name: impl Into<String>, listener: Listener) {
        self.push(Operation::RemoveListener { name: name.into(), listener });
    }

    /// Queue removal of all listeners of an event
    pub fn remove_listeners(&self, name: impl Into<String>) {
        self.push(Operation::RemoveListeners { name: name.into() });
    }

    /// Queue removal of a listener from every event
    pub fn remove_listener_everywhere(&self, listener: Listener) {
        self.push(Operation::RemoveListenerEverywhere { listener });
    }

    /// Queue removal of every listener
    pub fn remove_all_listeners(&self) {
        self.push(Operation::RemoveAllListeners);
    }

    /// Number of pending operations
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no operations are pending
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all pending operations without applying them
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Apply pending operations to `sink` until the queue is empty
    ///
    /// Operations pushed while draining (for example by listeners invoked by a
    /// dispatched event) are applied in the same call, after everything that
    /// was already pending. A listener that keeps re-queueing itself therefore
    /// keeps this call running; use [`apply_snapshot`](Self::apply_snapshot)
    /// when that growth must be bounded.
    ///
    /// Returns the number of operations applied.
    pub fn drain_into<S: EventSink + ?Sized>(&self, sink: &mut S) -> usize {
        let mut applied = 0;

        // The lock is released before each operation runs so listeners can push
        loop {
            let next = self.lock().pop_front();
            let Some(operation) = next else { break };

            operation.execute(sink);
            applied += 1;
        }

        applied
    }

    /// Apply only the operations pending at the time of the call
    ///
    /// Operations pushed while applying stay queued for the next call.
    /// Returns the number of operations applied.
    pub fn apply_snapshot<S: EventSink + ?Sized>(&self, sink: &mut S) -> usize {
        let snapshot = std::mem::take(&mut *self.lock());
        let applied = snapshot.len();

        for operation in snapshot {
            operation.execute(sink);
        }

        applied
    }
}

impl EventSink for EventQueue {
    fn add_listener(&mut self, name: &str, listener: Listener) {
        Self::add_listener(self, name, listener);
    }

    fn remove_listeners(&mut self, name: &str) {
        Self::remove_listeners(self, name);
    }

    fn remove_listener(&mut self, name: &str, listener: &Listener) {
        Self::remove_listener(self, name, listener.clone());
    }

    fn remove_listener_everywhere(&mut self, listener: &Listener) {
        Self::remove_listener_everywhere(self, listener.clone());
    }

    fn remove_all_listeners(&mut self) {
        Self::remove_all_listeners(self);
    }

    fn dispatch_event(&mut self, name: &str, data: EventData) {
        Self::dispatch_event(self, name, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DirectEventSystem;
    use std::sync::Arc;

    /// Sink that records the calls it receives
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl EventSink for RecordingSink {
        fn add_listener(&mut self, name: &str, _listener: Listener) {
            self.calls.push(format!("add:{name}"));
        }

        fn remove_listeners(&mut self, name: &str) {
            self.calls.push(format!("remove_all_of:{name}"));
        }

        fn remove_listener(&mut self, name: &str, _listener: &Listener) {
            self.calls.push(format!("remove:{name}"));
        }

        fn remove_listener_everywhere(&mut self, _listener: &Listener) {
            self.calls.push("remove_everywhere".to_string());
        }

        fn remove_all_listeners(&mut self) {
            self.calls.push("clear".to_string());
        }

        fn dispatch_event(&mut self, name: &str, _data: EventData) {
            self.calls.push(format!("dispatch:{name}"));
        }
    }

    #[test]
    fn test_drain_empty_queue_is_noop() {
        let queue = EventQueue::new();
        let mut sink = RecordingSink::default();

        assert_eq!(queue.drain_into(&mut sink), 0);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_drain_applies_in_submission_order_once() {
        let queue = EventQueue::new();
        let listener = Listener::new(|_| {});
        queue.dispatch_event("a", None);
        queue.add_listener("b", listener.clone());
        queue.remove_listener("c", listener.clone());
        queue.remove_listeners("d");
        queue.remove_listener_everywhere(listener);
        queue.remove_all_listeners();

        let mut sink = RecordingSink::default();
        assert_eq!(queue.drain_into(&mut sink), 6);
        assert_eq!(
            sink.calls,
            vec!["dispatch:a", "add:b", "remove:c", "remove_all_of:d", "remove_everywhere", "clear"]
        );

        // Nothing is applied twice
        assert_eq!(queue.drain_into(&mut sink), 0);
        assert_eq!(sink.calls.len(), 6);
    }

    #[test]
    fn test_dispatch_before_add_is_not_seen() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let listener = {
            let seen = Arc::clone(&seen);
            Listener::new(move |event| seen.lock().unwrap().push(event.name().to_string()))
        };

        let mut events = DirectEventSystem::new();
        let queue = events.queue().clone();
        queue.dispatch_event("Spawn", Some(Arc::new(1_u32)));
        queue.add_listener("Spawn", listener);
        queue.drain_into(&mut events);

        assert!(seen.lock().unwrap().is_empty());

        queue.dispatch_event("Spawn", Some(Arc::new(2_u32)));
        queue.drain_into(&mut events);
        assert_eq!(*seen.lock().unwrap(), vec!["Spawn"]);
    }

    #[test]
    fn test_reentrant_push_applied_before_drain_returns() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut events = DirectEventSystem::new();

        let chained = {
            let seen = Arc::clone(&seen);
            Listener::new(move |event| seen.lock().unwrap().push(event.name().to_string()))
        };
        events.add_listener("second", chained);

        let trigger = {
            let seen = Arc::clone(&seen);
            Listener::new(move |event| {
                seen.lock().unwrap().push(event.name().to_string());
                event.queue().dispatch_event("second", None);
            })
        };
        events.add_listener("first", trigger);

        let queue = events.queue().clone();
        queue.dispatch_event("first", None);
        queue.dispatch_event("third", None);

        // first, third, then the re-entrant second
        assert_eq!(queue.drain_into(&mut events), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_snapshot_leaves_reentrant_operations_queued() {
        let mut events = DirectEventSystem::new();
        events.add_listener(
            "tick",
            Listener::new(|event| event.queue().dispatch_event("tick", None)),
        );

        let queue = events.queue().clone();
        queue.dispatch_event("tick", None);

        assert_eq!(queue.apply_snapshot(&mut events), 1);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.apply_snapshot(&mut events), 1);
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_as_sink_records_calls() {
        let mut recorder = EventQueue::new();
        EventSink::dispatch_event(&mut recorder, "a", None);
        EventSink::remove_all_listeners(&mut recorder);

        let mut sink = RecordingSink::default();
        recorder.drain_into(&mut sink);
        assert_eq!(sink.calls, vec!["dispatch:a", "clear"]);
    }

    #[test]
    fn test_push_from_other_threads() {
        let queue = EventQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        queue.dispatch_event("hit", None);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let mut sink = RecordingSink::default();
        assert_eq!(queue.drain_into(&mut sink), 100);
    }
}
