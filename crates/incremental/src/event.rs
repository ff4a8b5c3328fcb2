//! Events a view emits to its listeners.

use sift_core::Mutation;
use sift_reactive::Event;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// A notification from a filtered view.
pub enum ViewEvent<E> {
    /// An entity entered the view.
    Add(Rc<E>),
    /// An entity left the view.
    Remove(Rc<E>),
    /// The view's order changed.
    Sort,
    /// A source mutation forwarded unchanged (`change`, `change:<attr>`,
    /// custom events, source `sort`).
    Bubbled(Mutation<E>),
}

impl<E> ViewEvent<E> {
    /// Returns the entity concerned, if any.
    pub fn entity(&self) -> Option<&Rc<E>> {
        match self {
            ViewEvent::Add(e) | ViewEvent::Remove(e) => Some(e),
            ViewEvent::Sort => None,
            ViewEvent::Bubbled(m) => m.entity(),
        }
    }
}

impl<E> Event for ViewEvent<E> {
    fn name(&self) -> Cow<'_, str> {
        match self {
            ViewEvent::Add(_) => Cow::Borrowed("add"),
            ViewEvent::Remove(_) => Cow::Borrowed("remove"),
            ViewEvent::Sort => Cow::Borrowed("sort"),
            ViewEvent::Bubbled(m) => m.kind.name(),
        }
    }
}

impl<E> Clone for ViewEvent<E> {
    fn clone(&self) -> Self {
        match self {
            ViewEvent::Add(e) => ViewEvent::Add(Rc::clone(e)),
            ViewEvent::Remove(e) => ViewEvent::Remove(Rc::clone(e)),
            ViewEvent::Sort => ViewEvent::Sort,
            ViewEvent::Bubbled(m) => ViewEvent::Bubbled(m.clone()),
        }
    }
}

impl<E> fmt::Debug for ViewEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
