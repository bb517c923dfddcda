use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Handle returned by `subscribe`, used to unsubscribe later
pub type SubscriptionId = u64;

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

type HandlerList = Vec<(SubscriptionId, SharedHandler)>;

/// Typed event bus.
///
/// Handlers run synchronously inside `publish`, in subscription order. The
/// bus is not locked while they run, so a handler may subscribe, unsubscribe
/// or publish other events on the same bus; subscription changes apply from
/// the next `publish`. A handler reached again while it is still running is
/// skipped.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, HandlerList>>>,
    next_id: AtomicU64,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Implement `Event` for plain event structs
#[macro_export]
macro_rules! impl_event {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::events::Event for $t {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }
        )*
    }
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers
            .entry(type_id)
            .or_default()
            .push((id, Arc::new(Mutex::new(handler))));
        id
    }

    /// Subscribe with a closure that receives the concrete event type
    pub fn subscribe_fn<E, F>(&self, mut f: F) -> SubscriptionId
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event: &dyn Event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }))
    }

    /// Remove a subscription, returns false when it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let mut removed = false;
        for list in handlers.values_mut() {
            let before = list.len();
            list.retain(|(handler_id, _)| *handler_id != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let snapshot: Vec<SharedHandler> = self
            .handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map(|list| list.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();

        for handler in snapshot {
            match handler.try_lock() {
                Some(mut handler) => handler.handle(&event),
                None => tracing::warn!("Skipping re-entrant event handler"),
            }
        }
    }

    /// Number of live subscriptions for an event type
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
