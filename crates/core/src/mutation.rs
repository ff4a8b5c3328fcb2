//! Mutation notifications delivered by a source collection.
//!
//! Every change a source makes is reported as a `Mutation`: what happened
//! (`MutationKind`), which entity it concerns (absent for collection-wide
//! events like `Reset` and `Sort`), and the options the mutation was made
//! with.

use alloc::borrow::Cow;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};

/// The kind of a source mutation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// An entity was inserted
    Add,
    /// An entity was removed
    Remove,
    /// The whole collection was replaced
    Reset,
    /// The collection was re-sorted
    Sort,
    /// Some attribute of an entity changed (generic `change`)
    Change,
    /// A specific attribute of an entity changed (`change:<name>`)
    ChangeAttribute(String),
    /// Any other event an entity raised
    Custom(String),
}

impl MutationKind {
    /// Returns the event name, e.g. `add` or `change:name`.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            MutationKind::Add => Cow::Borrowed("add"),
            MutationKind::Remove => Cow::Borrowed("remove"),
            MutationKind::Reset => Cow::Borrowed("reset"),
            MutationKind::Sort => Cow::Borrowed("sort"),
            MutationKind::Change => Cow::Borrowed("change"),
            MutationKind::ChangeAttribute(attr) => Cow::Owned(format!("change:{}", attr)),
            MutationKind::Custom(name) => Cow::Borrowed(name.as_str()),
        }
    }

    /// Parses an event name back into a kind.
    pub fn parse(name: &str) -> Self {
        match name {
            "add" => MutationKind::Add,
            "remove" => MutationKind::Remove,
            "reset" => MutationKind::Reset,
            "sort" => MutationKind::Sort,
            "change" => MutationKind::Change,
            other => match other.strip_prefix("change:") {
                Some(attr) if !attr.is_empty() => MutationKind::ChangeAttribute(attr.to_string()),
                _ => MutationKind::Custom(other.to_string()),
            },
        }
    }

    /// Returns the changed attribute for `ChangeAttribute`.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            MutationKind::ChangeAttribute(attr) => Some(attr.as_str()),
            _ => None,
        }
    }

    /// Returns true for `Change` and `ChangeAttribute`.
    pub fn is_change(&self) -> bool {
        matches!(self, MutationKind::Change | MutationKind::ChangeAttribute(_))
    }
}

/// Options a mutation was made with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationOptions {
    /// Part of a batch that may add entities
    pub add: bool,
    /// Part of a batch that may remove entities
    pub remove: bool,
    /// Explicit insertion index; disables sort deferral
    pub at: Option<usize>,
    /// `Some(false)` opts out of sorting after the batch
    pub sort: Option<bool>,
    /// Explicitly states whether a `Sort` notification will follow this
    /// mutation. When `None`, listeners infer it from the other flags.
    pub sort_pending: Option<bool>,
}

impl MutationOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an entity inserted by a bulk add.
    pub fn bulk_add() -> Self {
        Self {
            add: true,
            ..Self::default()
        }
    }

    /// Options for a `set` batch, which both adds and removes.
    pub fn batch_set() -> Self {
        Self {
            add: true,
            remove: true,
            ..Self::default()
        }
    }

    /// Sets the explicit insertion index.
    pub fn at(mut self, index: usize) -> Self {
        self.at = Some(index);
        self
    }

    /// Sets the sort opt-in/opt-out flag.
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Declares whether a `Sort` notification follows.
    pub fn sort_pending(mut self, pending: bool) -> Self {
        self.sort_pending = Some(pending);
        self
    }
}

/// A mutation notification from a source collection.
#[derive(Debug)]
pub struct Mutation<E> {
    /// What happened
    pub kind: MutationKind,
    /// The entity concerned, if any
    pub entity: Option<Rc<E>>,
    /// The options of the originating call
    pub options: MutationOptions,
}

impl<E> Clone for Mutation<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            entity: self.entity.clone(),
            options: self.options.clone(),
        }
    }
}

impl<E> Mutation<E> {
    /// Creates a mutation concerning one entity.
    pub fn new(kind: MutationKind, entity: Rc<E>, options: MutationOptions) -> Self {
        Self {
            kind,
            entity: Some(entity),
            options,
        }
    }

    /// Creates a collection-wide mutation (`Reset`, `Sort`).
    pub fn collection(kind: MutationKind, options: MutationOptions) -> Self {
        Self {
            kind,
            entity: None,
            options,
        }
    }

    /// Returns the entity concerned, if any.
    #[inline]
    pub fn entity(&self) -> Option<&Rc<E>> {
        self.entity.as_ref()
    }
}
