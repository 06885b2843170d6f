//! Arcade Event Bus
//!
//! Typed, in-process publish/subscribe: producers publish event values,
//! consumers register callbacks against an event type, optionally narrowed
//! by runtime predicates.
//!
//! # Core concepts
//!
//! - **Lineage**: covariant delivery without reflection. Every event type
//!   implements [`Event`] and may declare ancestor views; a subscriber
//!   registered for an ancestor type receives every descendant event,
//!   viewed as the ancestor.
//! - **Filter chains**: [`EventBus::register`] returns a [`FilterChain`]
//!   handle. Predicates appended to it (at registration or any time later)
//!   are AND-combined and gate future deliveries.
//! - **Synchronous fan-out**: `publish` invokes every matching callback on
//!   the publishing thread and returns when the last one does. There are
//!   no internal threads, no queues, and no back-pressure.
//!
//! # Concurrency
//!
//! `register` and `publish` may be called concurrently from any number of
//! threads. The registry map and the per-type subscription lists are
//! append-only; dispatch works from copy-on-write snapshots, so callbacks
//! run without any bus lock held and a registration that completes before
//! a publish begins is always visible to it. Within one event type,
//! delivery follows registration order; across types it is unspecified.
//!
//! # Failure semantics
//!
//! [`EventBus::publish`] is fail-fast: a panicking callback unwinds out of
//! the publish call and aborts delivery to subscriptions not yet reached.
//! [`EventBus::publish_isolated`] contains each callback failure instead
//! and reports them all in a [`PublishError`].
//!
//! There is no unsubscribe: subscriptions live as long as the bus. This is
//! a deliberate limitation; [`SubscriptionId`] identifies subscriptions in
//! logs and failure reports but is not a cancellation handle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use arcade_event::prelude::*;
//!
//! struct Shape { sides: u32 }
//! impl Event for Shape {}
//!
//! struct Circle { shape: Shape, radius: f64 }
//! impl Event for Circle {
//!     fn lineage(&self) -> Lineage<'_> {
//!         Lineage::of(self).ancestor(&self.shape)
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let shapes_seen = Arc::new(AtomicU32::new(0));
//!
//! let sink = Arc::clone(&shapes_seen);
//! bus.register(move |_: &Shape| {
//!     sink.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! // A Circle is a Shape, so the Shape subscriber sees it too.
//! bus.publish(&Circle { shape: Shape { sides: 1 }, radius: 2.0 });
//! assert_eq!(shapes_seen.load(Ordering::SeqCst), 1);
//! ```

mod bus;
mod event;
mod filter;
mod registry;
mod subscription;

pub use bus::{DeliveryFailure, EventBus, PublishError};
pub use event::{Event, EventView, Lineage};
pub use filter::FilterChain;
pub use subscription::SubscriptionId;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Event, EventBus, FilterChain, Lineage, PublishError, SubscriptionId};
}
