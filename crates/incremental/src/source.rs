//! The contract a view consumes from its source collection.

use crate::predicate::Comparator;
use sift_core::{Entity, Mutation};
use sift_index::Query;
use sift_reactive::SubscriptionId;
use std::rc::Rc;

/// Callback receiving every mutation of a source.
pub type SourceListener<E> = Rc<dyn Fn(&Mutation<E>)>;

/// An ordered, observable collection of entities.
///
/// Implementations must deliver notifications synchronously and must not hold
/// any internal borrow while a listener runs: a view reads the source back
/// from inside its listener.
pub trait Source<E: Entity> {
    /// Returns the current members in collection order.
    fn snapshot(&self) -> Vec<Rc<E>>;

    /// Returns the member at `index`.
    fn at(&self, index: usize) -> Option<Rc<E>>;

    /// Returns the number of members.
    fn len(&self) -> usize;

    /// Returns true if there are no members.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a member by key, identity or counterpart entity.
    fn get(&self, query: &Query<'_, E>, index: Option<&str>) -> Option<Rc<E>>;

    /// Registers a listener for every mutation.
    fn subscribe(&self, listener: SourceListener<E>) -> SubscriptionId;

    /// Removes a listener. Returns true if it was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Returns the collection's own sort rule.
    fn comparator(&self) -> Option<Comparator<E>>;

    /// Returns the declared index attribute names.
    fn indexes(&self) -> Vec<String>;

    /// Returns the primary key attribute name.
    fn main_index(&self) -> String;

    /// Serializes a list of entities the way this collection serializes itself.
    fn serialize(&self, entities: &[Rc<E>]) -> serde_json::Value;
}
