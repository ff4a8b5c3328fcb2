//! Reconciliation of a view against its source.
//!
//! `ViewState` owns the derived sequence, its index tables and the filter set.
//! Full recomputes build fresh tables and swap them in; source mutations go
//! through `classify` and usually touch a single entity. Every operation
//! returns the events to emit, so callers can release their borrow of the
//! state before notifying anyone.

use crate::classify::{classify, Action, Resort};
use crate::event::ViewEvent;
use crate::predicate::Comparator;
use crate::source::Source;
use crate::spec::FilterSet;
use crate::stats::ViewStats;
use sift_core::{Entity, Mutation};
use sift_index::IndexTables;
use sift_reactive::ChangeSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// The derived state of a filtered view.
pub struct ViewState<E> {
    /// Members in view order.
    models: Vec<Rc<E>>,
    /// Index tables mirroring `models`.
    indexes: IndexTables<E>,
    /// Active predicates, watched attributes and local comparator.
    filters: FilterSet<E>,
    stats: ViewStats,
}

impl<E: Entity> ViewState<E> {
    /// Creates an empty state indexed like a source with these declarations.
    pub fn new<S: AsRef<str>>(main_index: &str, indexes: &[S]) -> Self {
        Self {
            models: Vec::new(),
            indexes: IndexTables::new(main_index, indexes),
            filters: FilterSet::new(),
            stats: ViewStats::new(),
        }
    }

    /// Returns the members in view order.
    #[inline]
    pub fn models(&self) -> &[Rc<E>] {
        &self.models
    }

    /// Returns the index tables.
    #[inline]
    pub fn indexes(&self) -> &IndexTables<E> {
        &self.indexes
    }

    /// Returns the filter set.
    #[inline]
    pub fn filters(&self) -> &FilterSet<E> {
        &self.filters
    }

    /// Returns the filter set for modification. Call `reconcile` afterwards.
    #[inline]
    pub fn filters_mut(&mut self) -> &mut FilterSet<E> {
        &mut self.filters
    }

    /// Returns the work counters.
    #[inline]
    pub fn stats(&self) -> &ViewStats {
        &self.stats
    }

    /// Returns the comparator in force: the local one, else the source's.
    fn effective_comparator(&self, source: Option<Comparator<E>>) -> Option<Comparator<E>> {
        self.filters.comparator().cloned().or(source)
    }

    /// Recomputes the view from the source snapshot.
    ///
    /// Members are ordered by the effective comparator. Emits one `Remove`
    /// per departed member, then one `Add` per new member, then `Sort` if a
    /// local comparator is set and the order changed.
    pub fn reconcile(&mut self, source: &dyn Source<E>) -> Vec<ViewEvent<E>> {
        self.stats.record_full_reconcile();
        let snapshot = source.snapshot();
        let comparator = self.effective_comparator(source.comparator());
        let mut fresh = self.indexes.fresh();

        let models: Vec<Rc<E>> = if snapshot.is_empty() {
            Vec::new()
        } else {
            let mut passing: Vec<Rc<E>> = snapshot
                .into_iter()
                .filter(|e| self.filters.test(e))
                .collect();
            if let Some(cmp) = &comparator {
                cmp.sort(&mut passing);
            }
            for entity in &passing {
                fresh.add(entity);
            }
            passing
        };

        let changes = ChangeSet::diff(&self.models, &models, |e| e.cid());
        self.models = models;
        self.indexes = fresh;

        debug!(
            members = self.models.len(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            reordered = changes.reordered,
            "full reconcile"
        );

        let sorted = !changes.is_empty() && self.filters.comparator().is_some();
        let mut events: Vec<ViewEvent<E>> = Vec::with_capacity(changes.len() + 1);
        events.extend(changes.removed.into_iter().map(ViewEvent::Remove));
        events.extend(changes.added.into_iter().map(ViewEvent::Add));
        if sorted {
            events.push(ViewEvent::Sort);
        }
        events
    }

    /// Applies one source mutation.
    pub fn handle(&mut self, mutation: &Mutation<E>, source: &dyn Source<E>) -> Vec<ViewEvent<E>> {
        let source_comparator = source.comparator();
        let present = mutation
            .entity()
            .map(|e| self.indexes.contains(e))
            .unwrap_or(false);
        let class = classify(mutation, &self.filters, source_comparator.as_ref(), present);

        trace!(
            event = %mutation.kind.name(),
            present,
            action = ?class.action,
            resort = ?class.resort,
            "classified source mutation"
        );

        let mut events = Vec::new();
        match (class.action, mutation.entity()) {
            (Action::Reset, _) => return self.reconcile(source),
            (Action::Add, Some(entity)) => {
                if self.models.is_empty() {
                    return self.reconcile(source);
                }
                return self.add_model(entity, class.batched_sort, source_comparator, source);
            }
            (Action::Remove, Some(entity)) => {
                if self.remove_model(entity) {
                    events.push(ViewEvent::Remove(Rc::clone(entity)));
                }
                return events;
            }
            (Action::Bubble | Action::Sort, _) => {
                self.stats.record_bubble();
                events.push(ViewEvent::Bubbled(mutation.clone()));
            }
            _ => {}
        }

        // A member's indexed attribute changed: re-key it
        if let (Some(attr), Some(entity)) = (mutation.kind.attribute(), mutation.entity()) {
            if present && self.indexes.is_indexed(attr) {
                self.indexes.reindex(entity);
            }
        }

        if class.resort == Resort::Now {
            match self.effective_comparator(source_comparator) {
                Some(cmp) => {
                    cmp.sort(&mut self.models);
                    self.stats.record_resort();
                    if class.action != Action::Sort && self.filters.comparator().is_some() {
                        events.push(ViewEvent::Sort);
                    }
                }
                // Source order changed without a rule: only a recompute knows it
                None => events.extend(self.reconcile(source)),
            }
        }
        events
    }

    /// Inserts an entity that passed the filters.
    fn add_model(
        &mut self,
        entity: &Rc<E>,
        batched_sort: bool,
        source_comparator: Option<Comparator<E>>,
        source: &dyn Source<E>,
    ) -> Vec<ViewEvent<E>> {
        if batched_sort {
            // The source's own `sort` follows this batch
            self.models.push(Rc::clone(entity));
        } else {
            let position = match self.effective_comparator(source_comparator) {
                Some(cmp) => cmp.lower_bound(&self.models, entity),
                None => self.source_position(entity, source),
            };
            self.models.insert(position, Rc::clone(entity));
        }
        self.indexes.add(entity);
        self.stats.record_add();

        let mut events = Vec::with_capacity(2);
        if !batched_sort && self.filters.comparator().is_some() {
            events.push(ViewEvent::Sort);
        }
        events.push(ViewEvent::Add(Rc::clone(entity)));
        events
    }

    /// Returns where an entity goes in an unsorted view: after every member
    /// that precedes it in the source.
    fn source_position(&self, entity: &E, source: &dyn Source<E>) -> usize {
        let cid = entity.cid();
        let last = source.len().checked_sub(1).and_then(|i| source.at(i));
        if last.map(|e| e.cid() == cid).unwrap_or(false) {
            return self.models.len();
        }
        source
            .snapshot()
            .iter()
            .take_while(|e| e.cid() != cid)
            .filter(|e| self.indexes.contains(e))
            .count()
    }

    /// Removes a member. Returns false if the entity was not a member.
    fn remove_model(&mut self, entity: &Rc<E>) -> bool {
        if !self.indexes.contains(entity) {
            return false;
        }
        let cid = entity.cid();
        if let Some(i) = self.models.iter().position(|m| m.cid() == cid) {
            self.models.remove(i);
        }
        self.indexes.remove(entity);
        self.stats.record_remove();
        true
    }
}

impl<E> std::fmt::Debug for ViewState<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("members", &self.models.len())
            .field("filters", &self.filters.filters().len())
            .field("watched", &self.filters.watched())
            .field("comparator", &self.filters.comparator())
            .finish()
    }
}
