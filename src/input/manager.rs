use crate::input::events::InputEvent;
use crate::pipeline::slot::Event;
pub use crate::pipeline::slot::Subscription;

/// Broadcast hub for input-device events.
///
/// Devices dispatch into the manager; handlers receive events in
/// registration order. Dispatch is synchronous and single-threaded, with
/// the same deferred-reentrancy rule as slot change notifications.
pub struct InputManager {
    event: Event<InputEvent>,
}

impl InputManager {
    pub(crate) fn new() -> Self {
        Self { event: Event::new() }
    }

    /// Register an event handler; returns a handle to unsubscribe.
    pub fn subscribe(&self, handler: impl Fn(&InputEvent) + 'static) -> Subscription {
        self.event.subscribe(handler)
    }

    /// Remove a handler registered with [`subscribe`](InputManager::subscribe).
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.event.unsubscribe(subscription);
    }

    /// Broadcast an event to all handlers.
    pub fn dispatch(&self, event: &InputEvent) {
        tracing::trace!(?event, "input event");
        self.event.emit(event);
    }
}
