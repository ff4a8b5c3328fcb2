//! Event naming and topic matching.

use alloc::borrow::Cow;
use alloc::string::String;
use sift_core::Mutation;

/// An event that can be routed by name.
pub trait Event {
    /// Returns the name listeners subscribe to, e.g. `add` or `change:name`.
    fn name(&self) -> Cow<'_, str>;
}

/// What a listener subscribes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Topic {
    /// Every event
    All,
    /// Events with exactly this name
    Named(String),
}

impl Topic {
    /// Creates a topic for one event name.
    pub fn named(name: impl Into<String>) -> Self {
        Topic::Named(name.into())
    }

    /// Returns true if an event with `name` is delivered on this topic.
    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Topic::All => true,
            Topic::Named(n) => n == name,
        }
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        if name == "all" {
            Topic::All
        } else {
            Topic::Named(name.into())
        }
    }
}

impl<E> Event for Mutation<E> {
    fn name(&self) -> Cow<'_, str> {
        self.kind.name()
    }
}
