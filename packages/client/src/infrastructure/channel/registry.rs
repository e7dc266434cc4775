//! Handler registry shared by channel implementations.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::domain::{EventHandler, EventKind, InboundEvent, SubscriptionId};

struct Registration {
    id: SubscriptionId,
    kind: EventKind,
    handler: EventHandler,
}

/// Ordered list of event handlers keyed by subscription id
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for `kind`
    pub fn register(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registration { id, kind, handler });
        id
    }

    /// Remove a handler. Returns `false` if the id is unknown.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        registrations.len() != before
    }

    /// Invoke every handler registered for the event's kind, in registration
    /// order. Returns how many handlers ran.
    ///
    /// The lock is released before the handlers run, so a handler may call
    /// `register`/`remove` itself.
    pub fn dispatch(&self, event: &InboundEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.handler.clone())
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Number of handlers registered for `kind`
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|r| r.kind == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
