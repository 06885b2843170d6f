//! Predicate chains for narrowing subscriptions.

use std::sync::Arc;

use parking_lot::RwLock;

type Predicate<E> = dyn Fn(&E) -> bool + Send + Sync;

/// Append-only, AND-combined chain of predicates over one event type.
///
/// [`EventBus::register`](crate::EventBus::register) hands the caller a
/// chain handle; the subscription keeps another handle to the same chain
/// and consults it on every dispatch. Predicates appended after
/// registration apply to subsequent publishes immediately. An empty chain
/// always matches. There is no removal.
pub struct FilterChain<E> {
    predicates: Arc<RwLock<Vec<Arc<Predicate<E>>>>>,
}

// Derived Clone would demand E: Clone; handles only share the Arc.
impl<E> Clone for FilterChain<E> {
    fn clone(&self) -> Self {
        Self {
            predicates: Arc::clone(&self.predicates),
        }
    }
}

impl<E> Default for FilterChain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> FilterChain<E> {
    /// Create a new empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a predicate and return another handle to the same chain,
    /// so calls chain fluently:
    ///
    /// ```
    /// use arcade_event::{Event, EventBus};
    ///
    /// struct Tick { count: u64 }
    /// impl Event for Tick {}
    ///
    /// let bus = EventBus::new();
    /// bus.register(|_: &Tick| {})
    ///     .filter(|tick| tick.count % 2 == 0)
    ///     .filter(|tick| tick.count > 0);
    /// ```
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicates.write().push(Arc::new(predicate));
        self.clone()
    }

    /// True iff the chain is empty or every predicate passes the event.
    ///
    /// The lock is held only to snapshot the predicate list, never while
    /// user predicates run.
    #[must_use]
    pub fn matches(&self, event: &E) -> bool {
        let predicates = self.predicates.read().clone();
        predicates.iter().all(|predicate| predicate(event))
    }

    /// Number of predicates currently in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.read().len()
    }

    /// Whether the chain has no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.read().is_empty()
    }
}

impl<E> core::fmt::Debug for FilterChain<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FilterChain")
            .field("predicates", &self.len())
            .finish()
    }
}
