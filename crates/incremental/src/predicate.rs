//! Filter predicates and sort rules.

use sift_core::{Entity, Value};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A shared boolean test over one entity.
///
/// Predicates are compared by identity: two predicates are equal only if they
/// are clones of the same handle, never because they compute the same thing.
pub struct Predicate<E>(Rc<dyn Fn(&E) -> bool>);

impl<E> Predicate<E> {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) -> bool + 'static,
    {
        Self(Rc::new(f))
    }

    /// Runs the test.
    #[inline]
    pub fn test(&self, entity: &E) -> bool {
        (self.0)(entity)
    }

    /// Returns true if both handles wrap the same closure.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<E: Entity> Predicate<E> {
    /// Builds an equality test `attribute(name) == value`.
    ///
    /// Numbers compare by value, so `6` matches `6.0`.
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::new(move |e: &E| e.attribute(&name).cmp(&value) == Ordering::Equal)
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A sort rule for entities.
pub enum Comparator<E> {
    /// Ascending by one attribute's `Value`.
    Attribute(String),
    /// Ascending by an extracted key.
    Key(Rc<dyn Fn(&E) -> Value>),
    /// A direct two-entity ordering.
    Relation(Rc<dyn Fn(&E, &E) -> Ordering>),
}

impl<E> Comparator<E> {
    /// Sorts by an attribute.
    pub fn attribute(name: impl Into<String>) -> Self {
        Comparator::Attribute(name.into())
    }

    /// Sorts by a key extracted from each entity.
    pub fn key<F>(f: F) -> Self
    where
        F: Fn(&E) -> Value + 'static,
    {
        Comparator::Key(Rc::new(f))
    }

    /// Sorts by a relation between two entities.
    pub fn relation<F>(f: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + 'static,
    {
        Comparator::Relation(Rc::new(f))
    }

    /// Returns the attribute name for `Attribute` comparators.
    pub fn as_attribute(&self) -> Option<&str> {
        match self {
            Comparator::Attribute(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl<E: Entity> Comparator<E> {
    /// Compares two entities.
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        match self {
            Comparator::Attribute(name) => a.attribute(name).cmp(&b.attribute(name)),
            Comparator::Key(key) => key(a).cmp(&key(b)),
            Comparator::Relation(rel) => rel(a, b),
        }
    }

    /// Stable sort of a member list.
    pub fn sort(&self, models: &mut [Rc<E>]) {
        models.sort_by(|a, b| self.compare(a, b));
    }

    /// Returns the first position whose member does not sort before `entity`.
    pub fn lower_bound(&self, models: &[Rc<E>], entity: &E) -> usize {
        models.partition_point(|m| self.compare(m, entity) == Ordering::Less)
    }

    /// Returns true if `models` is non-decreasing.
    pub fn is_sorted(&self, models: &[Rc<E>]) -> bool {
        models
            .windows(2)
            .all(|w| self.compare(&w[0], &w[1]) != Ordering::Greater)
    }
}

impl<E> Clone for Comparator<E> {
    fn clone(&self) -> Self {
        match self {
            Comparator::Attribute(name) => Comparator::Attribute(name.clone()),
            Comparator::Key(key) => Comparator::Key(Rc::clone(key)),
            Comparator::Relation(rel) => Comparator::Relation(Rc::clone(rel)),
        }
    }
}

impl<E> From<&str> for Comparator<E> {
    fn from(name: &str) -> Self {
        Comparator::Attribute(name.to_string())
    }
}

impl<E> fmt::Debug for Comparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Comparator::Key(_) => f.write_str("Key(..)"),
            Comparator::Relation(_) => f.write_str("Relation(..)"),
        }
    }
}
