//! View statistics.
//!
//! Counters that tell incremental work apart from full recomputes.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Work counters for a filtered view.
#[derive(Debug, Default)]
pub struct ViewStats {
    /// Full recomputes from the source snapshot.
    full_reconciles: AtomicUsize,
    /// Entities inserted without a full recompute.
    incremental_adds: AtomicUsize,
    /// Entities removed without a full recompute.
    incremental_removes: AtomicUsize,
    /// In-place re-sorts.
    resorts: AtomicUsize,
    /// Source mutations forwarded to listeners.
    bubbled: AtomicUsize,
}

impl ViewStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_reconciles(&self) -> usize {
        self.full_reconciles.load(Ordering::Relaxed)
    }

    pub fn incremental_adds(&self) -> usize {
        self.incremental_adds.load(Ordering::Relaxed)
    }

    pub fn incremental_removes(&self) -> usize {
        self.incremental_removes.load(Ordering::Relaxed)
    }

    pub fn resorts(&self) -> usize {
        self.resorts.load(Ordering::Relaxed)
    }

    pub fn bubbled(&self) -> usize {
        self.bubbled.load(Ordering::Relaxed)
    }

    pub(crate) fn record_full_reconcile(&self) {
        self.full_reconciles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_add(&self) {
        self.incremental_adds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.incremental_removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resort(&self) {
        self.resorts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bubble(&self) {
        self.bubbled.fetch_add(1, Ordering::Relaxed);
    }
}

impl Clone for ViewStats {
    fn clone(&self) -> Self {
        Self {
            full_reconciles: AtomicUsize::new(self.full_reconciles()),
            incremental_adds: AtomicUsize::new(self.incremental_adds()),
            incremental_removes: AtomicUsize::new(self.incremental_removes()),
            resorts: AtomicUsize::new(self.resorts()),
            bubbled: AtomicUsize::new(self.bubbled()),
        }
    }
}
