//! Concurrent subscription registry.
//!
//! The outer map and the per-type lists are the bus's only shared mutable
//! state, and both are append-only. Dispatch works from snapshots, so no
//! lock is ever held while user callbacks run.

use core::any::TypeId;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::subscription::{Subscription, SubscriptionId};

/// Immutable snapshot of one type's subscriptions, in registration order.
pub(crate) type ListSnapshot = Arc<Vec<Arc<Subscription>>>;

/// Copy-on-write, append-only list of subscriptions for one event type.
///
/// An append builds a fresh vector and swaps it in; a snapshot hands out
/// the current one. Snapshots taken before an append never observe it, and
/// an in-progress reader is never invalidated by a writer.
#[derive(Default)]
pub(crate) struct SubscriptionList {
    entries: RwLock<ListSnapshot>,
}

impl SubscriptionList {
    /// Append a subscription, preserving registration order.
    pub(crate) fn push(&self, subscription: Arc<Subscription>) {
        let mut entries = self.entries.write();
        let mut next = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().map(Arc::clone));
        next.push(subscription);
        *entries = Arc::new(next);
    }

    /// Snapshot the current subscriptions.
    pub(crate) fn snapshot(&self) -> ListSnapshot {
        Arc::clone(&self.entries.read())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl core::fmt::Debug for SubscriptionList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubscriptionList")
            .field("entries", &self.len())
            .finish()
    }
}

/// Registry of subscriptions keyed by event type.
///
/// Keys are created lazily on first registration for a type and never
/// removed; the only transition a key ever makes is absent -> present.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    subscriptions: RwLock<HashMap<TypeId, Arc<SubscriptionList>>>,
    next_id: AtomicU32,
}

impl Registry {
    /// Allocate the next subscription ID.
    pub(crate) fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the list for a type, installing an empty one on first use.
    ///
    /// Idempotent under concurrency: racing calls for the same new type
    /// all land on one list, and a racing creation for a different type is
    /// never lost.
    pub(crate) fn list_for(&self, type_id: TypeId) -> Arc<SubscriptionList> {
        if let Some(list) = self.subscriptions.read().get(&type_id) {
            return Arc::clone(list);
        }
        let mut map = self.subscriptions.write();
        Arc::clone(map.entry(type_id).or_default())
    }

    /// Current subscriptions for a type, if any were ever registered.
    ///
    /// This is the dispatch read path: a registration that completed
    /// before the call is always visible; one racing with it may or may
    /// not be.
    pub(crate) fn snapshot(&self, type_id: TypeId) -> Option<ListSnapshot> {
        let list = self.subscriptions.read().get(&type_id).map(Arc::clone)?;
        Some(list.snapshot())
    }

    /// Number of event types with at least one registration attempt.
    pub(crate) fn type_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Total number of subscriptions across all types.
    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.read().values().map(|list| list.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::filter::FilterChain;

    struct Ping;

    impl Event for Ping {}

    fn noop_subscription(id: u32) -> Arc<Subscription> {
        Arc::new(Subscription::new(
            SubscriptionId::new(id),
            |_: &Ping| {},
            FilterChain::new(),
        ))
    }

    #[test]
    fn test_list_for_is_idempotent() {
        let registry = Registry::default();
        let type_id = TypeId::of::<Ping>();

        let first = registry.list_for(type_id);
        let second = registry.list_for(type_id);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.type_count(), 1);
    }

    #[test]
    fn test_snapshot_absent_type() {
        let registry = Registry::default();

        assert!(registry.snapshot(TypeId::of::<Ping>()).is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_appends() {
        let registry = Registry::default();
        let type_id = TypeId::of::<Ping>();

        let list = registry.list_for(type_id);
        list.push(noop_subscription(0));

        let snapshot = registry.snapshot(type_id).unwrap();
        assert_eq!(snapshot.len(), 1);

        list.push(noop_subscription(1));

        // The earlier snapshot is untouched; a fresh one sees the append.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.snapshot(type_id).unwrap().len(), 2);
    }

    #[test]
    fn test_push_preserves_registration_order() {
        let registry = Registry::default();
        let list = registry.list_for(TypeId::of::<Ping>());

        for id in 0..4 {
            list.push(noop_subscription(id));
        }

        let ids: Vec<u32> = registry
            .snapshot(TypeId::of::<Ping>())
            .unwrap()
            .iter()
            .map(|subscription| subscription.id().raw())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_concurrent_creation_lands_on_one_list() {
        let registry = Registry::default();
        let type_id = TypeId::of::<Ping>();

        let lists: Vec<Arc<SubscriptionList>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.list_for(type_id)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(registry.type_count(), 1);
        for list in &lists {
            assert!(Arc::ptr_eq(&lists[0], list));
        }
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let registry = Registry::default();
        let type_id = TypeId::of::<Ping>();
        registry.list_for(type_id);

        let registry = &registry;
        std::thread::scope(|scope| {
            for id in 0..16 {
                scope.spawn(move || {
                    // Re-resolve the list per thread, as register() does.
                    registry.list_for(type_id).push(noop_subscription(id));
                });
            }
        });

        assert_eq!(registry.subscription_count(), 16);
    }
}
