//! Index statistics for Sift.
//!
//! This module provides statistics tracking for index tables.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Statistics for a set of index tables.
#[derive(Debug)]
pub struct IndexStats {
    /// Number of entities currently indexed.
    entities: AtomicUsize,
    /// Number of (index, key) entries currently stored.
    keys: AtomicUsize,
    /// Number of entities skipped for an index because their value was empty.
    skipped: AtomicUsize,
}

impl IndexStats {
    /// Creates a new empty stats instance.
    pub fn new() -> Self {
        Self {
            entities: AtomicUsize::new(0),
            keys: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
        }
    }

    /// Returns the number of indexed entities.
    pub fn entities(&self) -> usize {
        self.entities.load(Ordering::Relaxed)
    }

    /// Returns the number of stored keys.
    pub fn keys(&self) -> usize {
        self.keys.load(Ordering::Relaxed)
    }

    /// Returns how many empty values were skipped.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Records an indexed entity with the given number of keys.
    pub fn add_entity(&self, keys: usize) {
        self.entities.fetch_add(1, Ordering::Relaxed);
        self.keys.fetch_add(keys, Ordering::Relaxed);
    }

    /// Records a removed entity with the given number of keys.
    pub fn remove_entity(&self, keys: usize) {
        self.entities.fetch_sub(1, Ordering::Relaxed);
        self.keys.fetch_sub(keys, Ordering::Relaxed);
    }

    /// Records an empty value that was not indexed.
    pub fn skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Resets the entity and key counts to zero.
    pub fn clear(&self) {
        self.entities.store(0, Ordering::Relaxed);
        self.keys.store(0, Ordering::Relaxed);
    }
}

impl Default for IndexStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IndexStats {
    fn clone(&self) -> Self {
        Self {
            entities: AtomicUsize::new(self.entities()),
            keys: AtomicUsize::new(self.keys()),
            skipped: AtomicUsize::new(self.skipped()),
        }
    }
}
