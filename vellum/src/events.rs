//! Lifecycle event bus
//!
//! UI collaborators (toolbar, tooltip, embed pickers) react to the editing
//! session through an explicit bus rather than through mixed-in emitter
//! behavior. Dispatch is synchronous and single-threaded, matching the
//! session's cooperative scheduling: a callback runs to completion before
//! the next event is delivered.
//!
//! Events carry no payload beyond their kind — subscribers re-read the
//! current state from the post and render tree.

/// A lifecycle notification emitted by the editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The document changed
    Update,
    /// A selection came into existence
    Selection,
    /// The active selection moved or changed shape
    SelectionUpdated,
    /// The selection was dismissed
    SelectionEnded,
}

/// Handle for a registered subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

/// Callback invoked for each dispatched event
pub type EventCallback = Box<dyn FnMut(LifecycleEvent)>;

/// Synchronous, single-threaded event dispatcher
pub struct EventBus {
    subscribers: Vec<(SubscriberId, EventCallback)>,
    next: u64,
}

impl EventBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next: 0,
        }
    }

    /// Register a callback for all lifecycle events
    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriberId {
        let id = SubscriberId(self.next);
        self.next += 1;
        self.subscribers.push((id, callback));
        id
    }

    /// Remove a subscriber
    ///
    /// # Returns
    /// * `true` - The subscriber existed and was removed
    /// * `false` - No such subscriber (already unsubscribed, or foreign id)
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        self.subscribers.len() != before
    }

    /// Dispatch an event to every subscriber, in subscription order
    pub fn emit(&mut self, event: LifecycleEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
