//! Event bus façade: registration and dispatch.

use core::any::TypeId;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, error, trace};

use crate::event::{Event, EventView};
use crate::filter::FilterChain;
use crate::registry::Registry;
use crate::subscription::{Subscription, SubscriptionId};

/// A callback panic caught by [`EventBus::publish_isolated`].
#[derive(Debug, thiserror::Error)]
#[error("subscription {} for {event_type} panicked: {reason}", .subscription.raw())]
pub struct DeliveryFailure {
    /// The subscription whose callback panicked.
    pub subscription: SubscriptionId,
    /// The type the subscription was registered under.
    pub event_type: &'static str,
    /// The panic payload, rendered to text.
    pub reason: String,
}

/// One or more callbacks panicked during [`EventBus::publish_isolated`].
#[derive(Debug, thiserror::Error)]
#[error("{} callback(s) panicked during publish", .failures.len())]
pub struct PublishError {
    /// Every failure encountered; delivery continued past each one.
    pub failures: Vec<DeliveryFailure>,
}

/// Thread-safe, in-process publish/subscribe event bus.
///
/// Producers publish typed event values; consumers register callbacks
/// against an event type, optionally narrowed by predicates on the
/// returned [`FilterChain`]. A subscriber registered for an ancestor type
/// receives the ancestor view of every descendant event (see
/// [`Event::lineage`]).
///
/// Cloning is cheap and every clone shares one registry. `register` and
/// `publish` may be called concurrently from any number of threads; all
/// delivery happens synchronously on the publishing thread.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use arcade_event::{Event, EventBus};
///
/// struct Tick { count: u64 }
/// impl Event for Tick {}
///
/// let bus = EventBus::new();
/// let total = Arc::new(AtomicU64::new(0));
///
/// let sink = Arc::clone(&total);
/// bus.register(move |tick: &Tick| {
///     sink.fetch_add(tick.count, Ordering::SeqCst);
/// })
/// .filter(|tick| tick.count % 2 == 0);
///
/// bus.publish(&Tick { count: 1 });
/// bus.publish(&Tick { count: 2 });
///
/// assert_eq!(total.load(Ordering::SeqCst), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    /// Create a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under event type `E`.
    ///
    /// Returns the subscription's [`FilterChain`]; predicates appended to
    /// it, at registration time or any time later, narrow future
    /// deliveries. Registering the same type repeatedly adds independent
    /// subscriptions. Subscriptions are never removed.
    pub fn register<E, F>(&self, callback: F) -> FilterChain<E>
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let chain = FilterChain::new();
        let id = self.registry.next_id();
        let subscription = Arc::new(Subscription::new(id, callback, chain.clone()));

        debug!(
            event = subscription.event_name(),
            id = id.raw(),
            "registered subscription"
        );
        self.registry.list_for(TypeId::of::<E>()).push(subscription);
        chain
    }

    /// Publish an event to every matching subscription.
    ///
    /// The event is delivered under every type in its lineage, in
    /// registration order within each type; ordering across types is
    /// unspecified. Returns once all matched callbacks have returned.
    ///
    /// Fail-fast: a panicking callback unwinds out of `publish` and aborts
    /// delivery to any subscriptions not yet reached. Use
    /// [`EventBus::publish_isolated`] to contain callback failures instead.
    pub fn publish<E: Event>(&self, event: &E) {
        self.dispatch(event, |view, subscription| {
            subscription.deliver(view.value());
        });
    }

    /// Publish an event, isolating callback panics.
    ///
    /// Like [`EventBus::publish`], but each delivery is wrapped in
    /// `catch_unwind`: a panicking callback does not stop delivery to the
    /// subscriptions after it. All failures are collected and returned.
    pub fn publish_isolated<E: Event>(&self, event: &E) -> Result<(), PublishError> {
        let mut failures = Vec::new();

        self.dispatch(event, |view, subscription| {
            let delivery =
                panic::catch_unwind(AssertUnwindSafe(|| subscription.deliver(view.value())));
            if let Err(payload) = delivery {
                let reason = panic_reason(payload.as_ref());
                error!(
                    event = view.type_name(),
                    id = subscription.id().raw(),
                    %reason,
                    "callback panicked"
                );
                failures.push(DeliveryFailure {
                    subscription: subscription.id(),
                    event_type: subscription.event_name(),
                    reason,
                });
            }
        });

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PublishError { failures })
        }
    }

    /// Total number of subscriptions across all event types.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.registry.subscription_count()
    }

    /// Number of distinct event types with registrations.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.registry.type_count()
    }

    /// Walk the event's lineage and hand every matching subscription, in
    /// registration order within its type, to `deliver`.
    fn dispatch<E, D>(&self, event: &E, mut deliver: D)
    where
        E: Event,
        D: FnMut(&EventView<'_>, &Subscription),
    {
        let lineage = event.lineage();
        // Diamond declarations must not double-deliver.
        let mut seen: SmallVec<[TypeId; 4]> = SmallVec::new();

        for view in lineage.views() {
            if seen.contains(&view.type_id()) {
                continue;
            }
            seen.push(view.type_id());

            let Some(subscriptions) = self.registry.snapshot(view.type_id()) else {
                continue;
            };
            trace!(
                event = view.type_name(),
                matched = subscriptions.len(),
                "dispatching"
            );
            for subscription in subscriptions.iter() {
                deliver(view, subscription.as_ref());
            }
        }
    }
}

fn panic_reason(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
