//! The public filtered view.
//!
//! A `FilteredView` is a cheap handle over shared state. It subscribes to its
//! source when built and unsubscribes when the last handle is dropped or
//! `detach` is called. State changes always complete before any listener is
//! notified, so listeners may read the view or change its filters.

use crate::event::ViewEvent;
use crate::predicate::{Comparator, Predicate};
use crate::reconcile::ViewState;
use crate::source::Source;
use crate::spec::{Filters, ViewSpec};
use crate::stats::ViewStats;
use sift_core::{Entity, Error, Mutation, Result, Value};
use sift_index::{IndexStats, Query};
use sift_reactive::{Emitter, EventBus, SubscriptionId, Topic};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;

struct Shared<E: Entity> {
    source: Rc<dyn Source<E>>,
    state: RefCell<ViewState<E>>,
    emitter: Rc<dyn Emitter<ViewEvent<E>>>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl<E: Entity> Shared<E> {
    fn on_source_event(&self, mutation: &Mutation<E>) {
        let events = self.state.borrow_mut().handle(mutation, &*self.source);
        self.dispatch(events);
    }

    /// Runs `f` against the state, then emits what it returned.
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ViewState<E>, &dyn Source<E>) -> Vec<ViewEvent<E>>,
    {
        let events = {
            let mut state = self.state.borrow_mut();
            f(&mut *state, &*self.source)
        };
        self.dispatch(events);
    }

    fn dispatch(&self, events: Vec<ViewEvent<E>>) {
        for event in &events {
            self.emitter.emit(event);
        }
    }

    fn detach(&self) {
        if let Some(id) = self.subscription.take() {
            self.source.unsubscribe(id);
        }
    }
}

impl<E: Entity> Drop for Shared<E> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// A filtered, sorted and indexed live view over a source collection.
pub struct FilteredView<E: Entity> {
    shared: Rc<Shared<E>>,
}

impl<E: Entity> Clone for FilteredView<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<E: Entity> FilteredView<E> {
    /// Creates a view over `source` with its own event bus.
    pub fn new(source: Rc<dyn Source<E>>, spec: ViewSpec<E>) -> Result<Self> {
        Self::with_emitter(source, spec, Rc::new(EventBus::new()))
    }

    /// Creates a view that publishes through `emitter`.
    pub fn with_emitter(
        source: Rc<dyn Source<E>>,
        spec: ViewSpec<E>,
        emitter: Rc<dyn Emitter<ViewEvent<E>>>,
    ) -> Result<Self> {
        spec.validate()?;
        let state = ViewState::new(&source.main_index(), &source.indexes());
        let shared = Rc::new(Shared {
            source,
            state: RefCell::new(state),
            emitter,
            subscription: Cell::new(None),
        });

        let view = Self { shared };
        view.configure(spec, true)?;

        let weak: Weak<Shared<E>> = Rc::downgrade(&view.shared);
        let id = view.shared.source.subscribe(Rc::new(move |mutation: &Mutation<E>| {
            if let Some(shared) = weak.upgrade() {
                shared.on_source_event(mutation);
            }
        }));
        view.shared.subscription.set(Some(id));
        Ok(view)
    }

    /// Returns the source this view observes.
    pub fn source(&self) -> Rc<dyn Source<E>> {
        Rc::clone(&self.shared.source)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Returns the member at `index`.
    pub fn at(&self, index: usize) -> Option<Rc<E>> {
        self.shared.state.borrow().models().get(index).cloned()
    }

    /// Looks up a member through the source, answering only for members.
    pub fn get<'q>(&self, query: impl Into<Query<'q, E>>, index: Option<&str>) -> Option<Rc<E>> {
        let query = query.into();
        let found = self.shared.source.get(&query, index)?;
        if self.shared.state.borrow().indexes().contains(&found) {
            Some(found)
        } else {
            None
        }
    }

    /// Like `get`, but reports a miss as `Error::NotFound`.
    pub fn try_get<'q>(&self, query: impl Into<Query<'q, E>>, index: Option<&str>) -> Result<Rc<E>> {
        let query = query.into();
        let name = index
            .map(str::to_string)
            .unwrap_or_else(|| self.shared.source.main_index());
        let key = match &query {
            Query::Key(v) => v.clone(),
            Query::Cid(cid) => Value::from(*cid),
            Query::Entity(e) => e.attribute(&name),
        };
        self.get(query, index).ok_or_else(|| Error::not_found(name, key))
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.shared.state.borrow().models().len()
    }

    /// Returns true if nothing passes the filters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Views behave as collections.
    #[inline]
    pub fn is_collection(&self) -> bool {
        true
    }

    /// Returns the local sort rule.
    pub fn comparator(&self) -> Option<Comparator<E>> {
        self.shared.state.borrow().filters().comparator().cloned()
    }

    /// Returns the active predicates.
    pub fn filters(&self) -> Vec<Predicate<E>> {
        self.shared.state.borrow().filters().filters().to_vec()
    }

    /// Returns the watched attributes.
    pub fn watched(&self) -> Vec<String> {
        self.shared.state.borrow().filters().watched().to_vec()
    }

    /// Returns a snapshot of the work counters.
    pub fn stats(&self) -> ViewStats {
        self.shared.state.borrow().stats().clone()
    }

    /// Returns a snapshot of the index statistics.
    pub fn index_stats(&self) -> IndexStats {
        self.shared.state.borrow().indexes().stats().clone()
    }

    // ---------------------------------------------------------------------
    // Filter control
    // ---------------------------------------------------------------------

    /// Adds a predicate and recomputes.
    pub fn add_filter(&self, predicate: Predicate<E>) {
        self.swap_filters(predicate, Filters::Listed(Vec::new()));
    }

    /// Removes a predicate (by identity) and recomputes.
    pub fn remove_filter(&self, predicate: &Predicate<E>) {
        self.swap_filters(Filters::Omitted, predicate);
    }

    /// Drops predicates and watched attributes, keeps the sort rule.
    pub fn clear_filters(&self) {
        self.shared.update(|state, source| {
            state.filters_mut().reset(false);
            state.reconcile(source)
        });
    }

    /// Removes `old` (every predicate when omitted), adds `new`, recomputes
    /// once.
    pub fn swap_filters(&self, new: impl Into<Filters<E>>, old: impl Into<Filters<E>>) {
        let (new, old) = (new.into(), old.into());
        self.shared.update(|state, source| {
            state.filters_mut().swap(new, old);
            state.reconcile(source)
        });
    }

    /// Applies a spec.
    ///
    /// With `reset_first` the current predicates, watched attributes and sort
    /// rule are dropped first and the view is recomputed. Otherwise the spec
    /// is merged and nothing is recomputed.
    pub fn configure(&self, spec: ViewSpec<E>, reset_first: bool) -> Result<()> {
        spec.validate()?;
        debug!(?spec, reset_first, "configuring view");
        self.shared.update(|state, source| {
            if reset_first {
                state.filters_mut().reset(true);
            }
            state.filters_mut().apply(spec);
            if reset_first {
                state.reconcile(source)
            } else {
                Vec::new()
            }
        });
        Ok(())
    }

    /// Drops every constraint and the local sort rule.
    pub fn reset(&self) {
        self.shared.update(|state, source| {
            state.filters_mut().reset(true);
            state.reconcile(source)
        });
    }

    /// Recomputes from the source.
    pub fn reconcile(&self) {
        self.shared.update(|state, source| state.reconcile(source));
    }

    /// Watches more attributes. Membership is not recomputed.
    pub fn watch<I, S>(&self, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared.state.borrow_mut().filters_mut().watch(attributes);
    }

    /// Stops watching attributes.
    pub fn unwatch<I, S>(&self, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.shared.state.borrow_mut().filters_mut().unwatch(attributes);
    }

    // ---------------------------------------------------------------------
    // Sequence passthroughs. Each works on a snapshot of the members, so
    // callbacks may use the view.
    // ---------------------------------------------------------------------

    /// Returns the members in order.
    pub fn models(&self) -> Vec<Rc<E>> {
        self.shared.state.borrow().models().to_vec()
    }

    /// Iterates over a snapshot of the members.
    pub fn iter(&self) -> std::vec::IntoIter<Rc<E>> {
        self.models().into_iter()
    }

    /// Returns the position of `entity`.
    pub fn index_of(&self, entity: &E) -> Option<usize> {
        let cid = entity.cid();
        self.shared
            .state
            .borrow()
            .models()
            .iter()
            .position(|m| m.cid() == cid)
    }

    /// Returns the last position of `entity`.
    pub fn last_index_of(&self, entity: &E) -> Option<usize> {
        let cid = entity.cid();
        self.shared
            .state
            .borrow()
            .models()
            .iter()
            .rposition(|m| m.cid() == cid)
    }

    /// Returns true if `entity` is a member.
    pub fn contains(&self, entity: &E) -> bool {
        self.shared.state.borrow().indexes().contains(entity)
    }

    pub fn every<F: FnMut(&Rc<E>) -> bool>(&self, f: F) -> bool {
        self.models().iter().all(f)
    }

    pub fn some<F: FnMut(&Rc<E>) -> bool>(&self, f: F) -> bool {
        self.models().iter().any(f)
    }

    pub fn for_each<F: FnMut(&Rc<E>)>(&self, f: F) {
        self.models().iter().for_each(f);
    }

    /// Alias of `for_each`.
    pub fn each<F: FnMut(&Rc<E>)>(&self, f: F) {
        self.for_each(f);
    }

    pub fn map<T, F: FnMut(&Rc<E>) -> T>(&self, f: F) -> Vec<T> {
        self.models().iter().map(f).collect()
    }

    pub fn filter<F: FnMut(&Rc<E>) -> bool>(&self, mut f: F) -> Vec<Rc<E>> {
        self.models().into_iter().filter(|m| f(m)).collect()
    }

    pub fn reduce<T, F: FnMut(T, &Rc<E>) -> T>(&self, init: T, f: F) -> T {
        self.models().iter().fold(init, f)
    }

    pub fn reduce_right<T, F: FnMut(T, &Rc<E>) -> T>(&self, init: T, f: F) -> T {
        self.models().iter().rev().fold(init, f)
    }

    // ---------------------------------------------------------------------
    // Events and serialization
    // ---------------------------------------------------------------------

    /// Subscribes to view events. `"all"` receives everything.
    pub fn on<F>(&self, topic: impl Into<Topic>, listener: F) -> SubscriptionId
    where
        F: Fn(&ViewEvent<E>) + 'static,
    {
        self.shared.emitter.on(topic.into(), Rc::new(listener))
    }

    /// Unsubscribes a listener.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.shared.emitter.off(id)
    }

    /// Serializes the members the way the source serializes itself.
    pub fn serialize(&self) -> serde_json::Value {
        let models = self.models();
        self.shared.source.serialize(&models)
    }

    /// Serializes the members to a JSON string.
    pub fn to_json(&self) -> String {
        self.serialize().to_string()
    }

    /// Stops following the source. The view keeps its current members.
    pub fn detach(&self) {
        self.shared.detach();
    }

    /// Returns true while the view follows its source.
    pub fn is_attached(&self) -> bool {
        let id = self.shared.subscription.get();
        id.is_some()
    }
}

impl<E: Entity> std::fmt::Debug for FilteredView<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredView")
            .field("state", &*self.shared.state.borrow())
            .field("attached", &self.is_attached())
            .finish()
    }
}
