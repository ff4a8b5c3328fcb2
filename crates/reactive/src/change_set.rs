//! Change set for tracking membership changes between two sequences.
//!
//! A ChangeSet represents the difference between two states of an ordered
//! member list: members that entered, members that left, and whether the
//! survivors changed relative order.

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashSet;

/// A set of changes to an ordered member list.
#[derive(Clone, Debug)]
pub struct ChangeSet<T> {
    /// Members present only in the new state, in new-state order
    pub added: Vec<T>,
    /// Members present only in the old state, in old-state order
    pub removed: Vec<T>,
    /// True if the members present in both states appear in a different order
    pub reordered: bool,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            reordered: false,
        }
    }
}

impl<T> ChangeSet<T> {
    /// Creates a new empty change set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no changes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && !self.reordered
    }

    /// Returns the number of membership changes.
    #[inline]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Records a member that entered.
    pub fn add(&mut self, item: T) {
        self.added.push(item);
    }

    /// Records a member that left.
    pub fn remove(&mut self, item: T) {
        self.removed.push(item);
    }

    /// Merges another change set into this one.
    pub fn merge(&mut self, other: ChangeSet<T>) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.reordered |= other.reordered;
    }

    /// Clears all changes.
    pub fn clear(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.reordered = false;
    }
}

impl<T: Clone> ChangeSet<T> {
    /// Computes the changes that turn `old` into `new`.
    ///
    /// Members are identified by `key`; both sequences are expected to hold
    /// each key at most once.
    pub fn diff<K, F>(old: &[T], new: &[T], key: F) -> Self
    where
        K: Hash + Eq,
        F: Fn(&T) -> K,
    {
        let old_keys: HashSet<K> = old.iter().map(&key).collect();
        let new_keys: HashSet<K> = new.iter().map(&key).collect();

        let removed: Vec<T> = old
            .iter()
            .filter(|item| !new_keys.contains(&key(item)))
            .cloned()
            .collect();
        let added: Vec<T> = new
            .iter()
            .filter(|item| !old_keys.contains(&key(item)))
            .cloned()
            .collect();

        // Compare survivor order
        let survivors_old = old.iter().map(&key).filter(|k| new_keys.contains(k));
        let survivors_new = new.iter().map(&key).filter(|k| old_keys.contains(k));
        let reordered = !survivors_old.eq(survivors_new);

        Self {
            added,
            removed,
            reordered,
        }
    }
}
