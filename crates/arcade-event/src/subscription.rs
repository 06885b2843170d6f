//! Type-erased subscription records.

use core::any::{Any, TypeId};

use crate::event::Event;
use crate::filter::FilterChain;

/// Unique identifier for a registered subscription.
///
/// Identity only: subscriptions are never removed, so this is not a
/// cancellation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u32);

impl SubscriptionId {
    /// Create a new subscription ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Type-erased deliver function.
///
/// Built at registration from the typed callback and its filter chain;
/// recovers the concrete event type via `downcast_ref`.
type DeliverFn = Box<dyn Fn(&dyn Any) + Send + Sync>;

/// One registration: a callback bound to an event type and a filter chain.
pub struct Subscription {
    /// Unique ID
    id: SubscriptionId,
    /// Event type this subscription was registered under
    event_type_id: TypeId,
    /// Event type name for logging
    event_name: &'static str,
    /// Filter evaluation + callback, type-erased
    callback: DeliverFn,
}

impl Subscription {
    /// Bind a typed callback and its filter chain under `E`.
    pub(crate) fn new<E, F>(id: SubscriptionId, callback: F, chain: FilterChain<E>) -> Self
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            id,
            event_type_id: TypeId::of::<E>(),
            event_name: E::event_name(),
            callback: Box::new(move |event: &dyn Any| {
                let Some(event) = event.downcast_ref::<E>() else {
                    // Unreachable through the bus: the registry files this
                    // subscription under E's TypeId, and dispatch only hands
                    // it views of that type.
                    debug_assert!(false, "subscription received a view of the wrong type");
                    return;
                };
                if chain.matches(event) {
                    callback(event);
                }
            }),
        }
    }

    /// Unique ID of this subscription.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The event type this subscription was registered under.
    #[must_use]
    pub fn event_type_id(&self) -> TypeId {
        self.event_type_id
    }

    /// The registered event type's name, for logging.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// Evaluate the filter chain and, if it passes, invoke the callback
    /// synchronously on the calling thread. A panicking callback unwinds
    /// into the caller.
    pub(crate) fn deliver(&self, event: &dyn Any) {
        (self.callback)(event);
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type_id", &self.event_type_id)
            .field("event_name", &self.event_name)
            .finish_non_exhaustive()
    }
}
