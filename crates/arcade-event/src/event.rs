//! Event trait and ancestor declarations.
//!
//! Rust has no runtime subtype reflection, so covariant delivery is driven
//! by an explicit lineage: each event type declares the ancestor views it
//! can be delivered as. A subscriber registered for an ancestor type
//! receives the ancestor view of every descendant event.

use core::any::{Any, TypeId};

use smallvec::SmallVec;

/// Trait for publishable event types.
///
/// The default implementation makes the event deliverable under its own
/// type only. Types with a declared ancestor override [`Event::lineage`]
/// and contribute a borrowed view of the ancestor value:
///
/// ```
/// use arcade_event::{Event, Lineage};
///
/// struct Shape { sides: u32 }
/// impl Event for Shape {}
///
/// struct Circle { shape: Shape, radius: f64 }
/// impl Event for Circle {
///     fn lineage(&self) -> Lineage<'_> {
///         Lineage::of(self).ancestor(&self.shape)
///     }
/// }
/// ```
///
/// Ancestor lineages compose transitively, so a type only ever names its
/// immediate parent.
pub trait Event: Send + Sync + 'static {
    /// The views this event can be delivered as, most-derived first.
    fn lineage(&self) -> Lineage<'_>
    where
        Self: Sized,
    {
        Lineage::of(self)
    }

    /// Get the event's type name for logging.
    fn event_name() -> &'static str
    where
        Self: Sized,
    {
        core::any::type_name::<Self>()
    }
}

/// One deliverable view of a live event.
///
/// Dispatch recovers the concrete type from `value` via `downcast_ref`,
/// checked against `type_id`; there is no unchecked cast anywhere.
#[derive(Clone, Copy)]
pub struct EventView<'a> {
    type_id: TypeId,
    type_name: &'static str,
    value: &'a dyn Any,
}

impl<'a> EventView<'a> {
    /// Create a view of an event under its own type.
    #[must_use]
    pub fn of<E: Event>(event: &'a E) -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: E::event_name(),
            value: event,
        }
    }

    /// The view type this event is deliverable as.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The view type's name, for logging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The event value, typed as the view type.
    #[must_use]
    pub fn value(&self) -> &'a dyn Any {
        self.value
    }
}

impl core::fmt::Debug for EventView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventView")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of an event's deliverable views, most-derived first.
///
/// Most events have a short lineage, so views live inline.
#[derive(Debug)]
pub struct Lineage<'a> {
    views: SmallVec<[EventView<'a>; 2]>,
}

impl<'a> Lineage<'a> {
    /// Start a lineage with the event's own view.
    #[must_use]
    pub fn of<E: Event>(event: &'a E) -> Self {
        let mut views = SmallVec::new();
        views.push(EventView::of(event));
        Self { views }
    }

    /// Append an ancestor view, including the ancestor's own lineage.
    #[must_use]
    pub fn ancestor<A: Event>(mut self, view: &'a A) -> Self {
        self.views.extend(view.lineage().views);
        self
    }

    /// All views in this lineage.
    #[must_use]
    pub fn views(&self) -> &[EventView<'a>] {
        &self.views
    }

    /// Whether the lineage contains a view of the given type.
    #[must_use]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.views.iter().any(|view| view.type_id == type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shape {
        sides: u32,
    }

    impl Event for Shape {}

    struct Circle {
        shape: Shape,
        radius: f64,
    }

    impl Event for Circle {
        fn lineage(&self) -> Lineage<'_> {
            Lineage::of(self).ancestor(&self.shape)
        }
    }

    // Two levels deep: Dot -> Circle -> Shape
    struct Dot {
        circle: Circle,
    }

    impl Event for Dot {
        fn lineage(&self) -> Lineage<'_> {
            Lineage::of(self).ancestor(&self.circle)
        }
    }

    #[test]
    fn test_default_lineage_is_self_only() {
        let shape = Shape { sides: 4 };
        let lineage = shape.lineage();

        assert_eq!(lineage.views().len(), 1);
        assert_eq!(lineage.views()[0].type_id(), TypeId::of::<Shape>());
        assert!(lineage.contains(TypeId::of::<Shape>()));
        assert!(!lineage.contains(TypeId::of::<Circle>()));
    }

    #[test]
    fn test_ancestor_view_most_derived_first() {
        let circle = Circle {
            shape: Shape { sides: 1 },
            radius: 7.0,
        };
        let lineage = circle.lineage();

        assert_eq!(lineage.views().len(), 2);
        assert_eq!(lineage.views()[0].type_id(), TypeId::of::<Circle>());
        assert_eq!(lineage.views()[1].type_id(), TypeId::of::<Shape>());
    }

    #[test]
    fn test_ancestor_lineage_composes_transitively() {
        let dot = Dot {
            circle: Circle {
                shape: Shape { sides: 1 },
                radius: 0.5,
            },
        };
        let lineage = dot.lineage();

        assert_eq!(lineage.views().len(), 3);
        assert!(lineage.contains(TypeId::of::<Dot>()));
        assert!(lineage.contains(TypeId::of::<Circle>()));
        assert!(lineage.contains(TypeId::of::<Shape>()));
    }

    #[test]
    fn test_view_downcasts_to_view_type() {
        let circle = Circle {
            shape: Shape { sides: 1 },
            radius: 7.0,
        };
        let lineage = circle.lineage();

        let circle_view = lineage.views()[0].value();
        assert_eq!(circle_view.downcast_ref::<Circle>().unwrap().radius, 7.0);
        assert!(circle_view.downcast_ref::<Shape>().is_none());

        let shape_view = lineage.views()[1].value();
        assert_eq!(shape_view.downcast_ref::<Shape>().unwrap().sides, 1);
    }
}
