//! Ordered, indexed collections of records.
//!
//! A `Collection` owns the canonical order of its records, keeps hash indexes
//! over them and republishes every record event as a `Mutation`. It is the
//! `Source` that filtered views follow.
//!
//! Bulk operations finish all their bookkeeping before the first
//! notification goes out, and no internal borrow is held while listeners run.

use crate::record::{Record, RecordEvent};
use hashbrown::{HashMap, HashSet};
use sift_core::{Cid, Entity, Error, Mutation, MutationKind, MutationOptions, Result, DEFAULT_MAIN_INDEX};
use sift_incremental::{Comparator, Source, SourceListener};
use sift_index::{IndexTables, Query};
use sift_reactive::{Emitter, EventBus, SubscriptionId, Topic};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Construction options for a `Collection`.
#[derive(Clone, Debug)]
pub struct CollectionOptions {
    main_index: String,
    indexes: Vec<String>,
    comparator: Option<Comparator<Record>>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            main_index: DEFAULT_MAIN_INDEX.to_string(),
            indexes: Vec::new(),
            comparator: None,
        }
    }
}

impl CollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary key attribute.
    pub fn main_index(mut self, name: impl Into<String>) -> Self {
        self.main_index = name.into();
        self
    }

    /// Declares an additional index attribute.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.indexes.push(name.into());
        self
    }

    /// Declares several index attributes.
    pub fn indexes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Keeps the collection sorted by `comparator`.
    pub fn comparator(mut self, comparator: impl Into<Comparator<Record>>) -> Self {
        self.comparator = Some(comparator.into());
        self
    }
}

/// Options for `Collection::add_with` and `Collection::set_with`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Insert at this position instead of sorting
    pub at: Option<usize>,
    /// `Some(false)` leaves the collection unsorted after the batch
    pub sort: Option<bool>,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, index: usize) -> Self {
        self.at = Some(index);
        self
    }

    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = Some(sort);
        self
    }

    fn mutation_options(&self, base: MutationOptions) -> MutationOptions {
        MutationOptions {
            at: self.at,
            sort: self.sort,
            ..base
        }
    }
}

/// An observable, ordered collection of records.
pub struct Collection {
    this: Weak<Collection>,
    main_index: String,
    declared: Vec<String>,
    models: RefCell<Vec<Rc<Record>>>,
    indexes: RefCell<IndexTables<Record>>,
    comparator: RefCell<Option<Comparator<Record>>>,
    bus: EventBus<Mutation<Record>>,
    record_subs: RefCell<HashMap<Cid, SubscriptionId>>,
}

impl Collection {
    /// Creates an empty collection.
    pub fn new(options: CollectionOptions) -> Rc<Self> {
        let CollectionOptions {
            main_index,
            indexes,
            comparator,
        } = options;
        let tables = IndexTables::new(&main_index, &indexes);
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            main_index,
            declared: indexes,
            models: RefCell::new(Vec::new()),
            indexes: RefCell::new(tables),
            comparator: RefCell::new(comparator),
            bus: EventBus::new(),
            record_subs: RefCell::new(HashMap::new()),
        })
    }

    /// Creates a collection holding `records`, without notifying anyone.
    pub fn with_records<I, R>(options: CollectionOptions, records: I) -> Rc<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        let collection = Self::new(options);
        collection.load(records.into_iter().map(Into::into).collect());
        collection
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
    }

    pub fn at(&self, index: usize) -> Option<Rc<Record>> {
        self.models.borrow().get(index).cloned()
    }

    /// Returns the records in collection order.
    pub fn models(&self) -> Vec<Rc<Record>> {
        self.models.borrow().clone()
    }

    /// Looks up a record by key, identity or counterpart record.
    pub fn get<'q>(&self, query: impl Into<Query<'q, Record>>, index: Option<&str>) -> Option<Rc<Record>> {
        self.indexes.borrow().lookup(&query.into(), index)
    }

    /// Returns the position of a record.
    pub fn index_of(&self, record: &Record) -> Option<usize> {
        let cid = record.cid();
        self.models.borrow().iter().position(|m| m.cid() == cid)
    }

    pub fn comparator(&self) -> Option<Comparator<Record>> {
        self.comparator.borrow().clone()
    }

    /// Replaces the sort rule. The records are not re-sorted until `sort`.
    pub fn set_comparator(&self, comparator: Option<Comparator<Record>>) {
        *self.comparator.borrow_mut() = comparator;
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Adds records, skipping any already present by identity or primary key.
    /// Returns the records that were added.
    pub fn add<I, R>(&self, records: I) -> Vec<Rc<Record>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        self.insert(
            records.into_iter().map(Into::into).collect(),
            AddOptions::new(),
            MutationOptions::bulk_add(),
        )
    }

    /// Adds records with explicit placement options.
    pub fn add_with<I, R>(&self, records: I, options: AddOptions) -> Result<Vec<Rc<Record>>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        self.check_position(options.at)?;
        Ok(self.insert(
            records.into_iter().map(Into::into).collect(),
            options,
            MutationOptions::bulk_add(),
        ))
    }

    /// Removes records, matched by identity or primary key.
    /// Returns the records that were removed.
    pub fn remove<I, R>(&self, records: I) -> Vec<Rc<Record>>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Record>,
    {
        let removed = self.take(records);
        self.notify_removed(&removed, MutationOptions::new());
        removed
    }

    /// Replaces every record and emits a single `reset`.
    pub fn reset<I, R>(&self, records: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        let old = std::mem::take(&mut *self.models.borrow_mut());
        for record in &old {
            self.release(record);
        }
        self.indexes.borrow_mut().reset();
        self.load(records.into_iter().map(Into::into).collect());

        trace!(len = self.len(), "collection reset");
        self.bus
            .emit(&Mutation::collection(MutationKind::Reset, MutationOptions::new()));
    }

    /// Makes the collection hold exactly `records`.
    ///
    /// Records whose primary key is already present are merged into the
    /// existing record. Records that are no longer listed are removed, then
    /// new ones are added.
    pub fn set<I, R>(&self, records: I) -> Vec<Rc<Record>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        self.set_with(records, AddOptions::new()).unwrap_or_default()
    }

    /// `set` with explicit placement options.
    pub fn set_with<I, R>(&self, records: I, options: AddOptions) -> Result<Vec<Rc<Record>>>
    where
        I: IntoIterator<Item = R>,
        R: Into<Rc<Record>>,
    {
        self.check_position(options.at)?;

        let mut keep: HashSet<Cid> = HashSet::new();
        let mut fresh = Vec::new();
        let mut merged_order_key = false;
        let sort_attribute = self
            .comparator()
            .and_then(|c| c.as_attribute().map(str::to_string));

        for record in records.into_iter().map(Into::into) {
            let existing = self.get(&*record, None);
            match existing {
                Some(existing) => {
                    keep.insert(existing.cid());
                    if !Rc::ptr_eq(&existing, &record) {
                        // Change notifications go out as each record is merged
                        let changed = existing.set_all(record.attributes());
                        if let Some(attr) = &sort_attribute {
                            merged_order_key |= changed.iter().any(|c| c == attr);
                        }
                    }
                }
                None => {
                    keep.insert(record.cid());
                    fresh.push(record);
                }
            }
        }

        let stale: Vec<Rc<Record>> = self
            .models()
            .into_iter()
            .filter(|m| !keep.contains(&m.cid()))
            .collect();
        let removed = self.take(stale.iter());
        self.notify_removed(&removed, options.mutation_options(MutationOptions::batch_set()));

        let added = self.insert(fresh, options, MutationOptions::batch_set());
        if added.is_empty() && merged_order_key && options.at.is_none() && options.sort != Some(false) {
            self.sort()?;
        }
        Ok(added)
    }

    /// Re-sorts by the comparator and emits `sort`.
    pub fn sort(&self) -> Result<()> {
        let comparator = self
            .comparator()
            .ok_or_else(|| Error::invalid_operation("cannot sort a collection without a comparator"))?;
        comparator.sort(&mut self.models.borrow_mut());
        self.bus
            .emit(&Mutation::collection(MutationKind::Sort, MutationOptions::new()));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Subscribes to the collection's mutations.
    pub fn on<F>(&self, topic: impl Into<Topic>, listener: F) -> SubscriptionId
    where
        F: Fn(&Mutation<Record>) + 'static,
    {
        self.bus.subscribe(topic.into(), listener)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    /// Returns the number of collection listeners, views included.
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Returns the records as a JSON array.
    pub fn to_json(&self) -> serde_json::Value {
        serialize_records(&self.models.borrow())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn check_position(&self, at: Option<usize>) -> Result<()> {
        match at {
            Some(at) if at > self.len() => Err(Error::invalid_operation(format!(
                "insert position {} out of range for {} records",
                at,
                self.len()
            ))),
            _ => Ok(()),
        }
    }

    fn is_present(&self, record: &Record) -> bool {
        let indexes = self.indexes.borrow();
        if indexes.contains(record) {
            return true;
        }
        let key = record.get(&self.main_index);
        !key.is_empty() && indexes.lookup(&Query::Key(key), None).is_some()
    }

    /// Inserts without notifying. Used by constructors and `reset`.
    fn load(&self, records: Vec<Rc<Record>>) {
        for record in records {
            if self.is_present(&record) {
                continue;
            }
            self.attach(&record);
            self.models.borrow_mut().push(record);
        }
        if let Some(comparator) = self.comparator() {
            comparator.sort(&mut self.models.borrow_mut());
        }
    }

    fn insert(&self, records: Vec<Rc<Record>>, options: AddOptions, base: MutationOptions) -> Vec<Rc<Record>> {
        let mut added = Vec::with_capacity(records.len());
        for record in records {
            if self.is_present(&record) {
                continue;
            }
            self.attach(&record);
            {
                let mut models = self.models.borrow_mut();
                match options.at {
                    Some(at) => {
                        let pos = (at + added.len()).min(models.len());
                        models.insert(pos, Rc::clone(&record));
                    }
                    None => models.push(Rc::clone(&record)),
                }
            }
            added.push(record);
        }
        if added.is_empty() {
            return added;
        }

        let comparator = self.comparator();
        let will_sort = comparator.is_some() && options.at.is_none() && options.sort != Some(false);
        if let (true, Some(comparator)) = (will_sort, comparator) {
            comparator.sort(&mut self.models.borrow_mut());
        }

        trace!(added = added.len(), will_sort, "collection add");
        let mutation_options = options.mutation_options(base).sort_pending(will_sort);
        for record in &added {
            self.bus.emit(&Mutation::new(
                MutationKind::Add,
                Rc::clone(record),
                mutation_options.clone(),
            ));
        }
        if will_sort {
            self.bus
                .emit(&Mutation::collection(MutationKind::Sort, mutation_options));
        }
        added
    }

    /// Removes without notifying. Returns the removed records in input order.
    fn take<I, R>(&self, records: I) -> Vec<Rc<Record>>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<Record>,
    {
        let mut removed = Vec::new();
        for record in records {
            let Some(found) = self.get(record.as_ref(), None) else {
                continue;
            };
            let cid = found.cid();
            {
                let mut models = self.models.borrow_mut();
                if let Some(pos) = models.iter().position(|m| m.cid() == cid) {
                    models.remove(pos);
                }
            }
            self.indexes.borrow_mut().remove(&found);
            self.release(&found);
            removed.push(found);
        }
        removed
    }

    fn notify_removed(&self, removed: &[Rc<Record>], options: MutationOptions) {
        if !removed.is_empty() {
            trace!(removed = removed.len(), "collection remove");
        }
        for record in removed {
            self.bus.emit(&Mutation::new(
                MutationKind::Remove,
                Rc::clone(record),
                options.clone(),
            ));
        }
    }

    /// Indexes a record and starts forwarding its events.
    fn attach(&self, record: &Rc<Record>) {
        self.indexes.borrow_mut().add(record);
        let collection = self.this.clone();
        let weak = Rc::downgrade(record);
        let id = record.on(Topic::All, move |event: &RecordEvent| {
            if let (Some(collection), Some(record)) = (collection.upgrade(), weak.upgrade()) {
                collection.forward(record, event);
            }
        });
        self.record_subs.borrow_mut().insert(record.cid(), id);
    }

    fn release(&self, record: &Record) {
        if let Some(id) = self.record_subs.borrow_mut().remove(&record.cid()) {
            record.off(id);
        }
    }

    fn forward(&self, record: Rc<Record>, event: &RecordEvent) {
        match &event.kind {
            // Membership changes are only ever reported by the collection
            MutationKind::Add | MutationKind::Remove | MutationKind::Reset | MutationKind::Sort => {}
            MutationKind::Custom(name) if name == "destroy" => {
                self.remove([record]);
            }
            kind => {
                if let Some(attr) = kind.attribute() {
                    let mut indexes = self.indexes.borrow_mut();
                    if attr == self.main_index || indexes.is_indexed(attr) {
                        indexes.reindex(&record);
                    }
                }
                trace!(event = %kind.name(), cid = record.cid(), "record event");
                self.bus
                    .emit(&Mutation::new(kind.clone(), record, MutationOptions::new()));
            }
        }
    }
}

fn serialize_records(records: &[Rc<Record>]) -> serde_json::Value {
    serde_json::Value::Array(records.iter().map(|r| r.to_json()).collect())
}

impl Source<Record> for Collection {
    fn snapshot(&self) -> Vec<Rc<Record>> {
        self.models()
    }

    fn at(&self, index: usize) -> Option<Rc<Record>> {
        Collection::at(self, index)
    }

    fn len(&self) -> usize {
        Collection::len(self)
    }

    fn get(&self, query: &Query<'_, Record>, index: Option<&str>) -> Option<Rc<Record>> {
        self.indexes.borrow().lookup(query, index)
    }

    fn subscribe(&self, listener: SourceListener<Record>) -> SubscriptionId {
        self.bus.on(Topic::All, listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    fn comparator(&self) -> Option<Comparator<Record>> {
        Collection::comparator(self)
    }

    fn indexes(&self) -> Vec<String> {
        self.declared.clone()
    }

    fn main_index(&self) -> String {
        self.main_index.clone()
    }

    fn serialize(&self, entities: &[Rc<Record>]) -> serde_json::Value {
        serialize_records(entities)
    }
}

impl Drop for Collection {
    fn drop(&mut self) {
        let subs = std::mem::take(self.record_subs.get_mut());
        for record in self.models.get_mut().iter() {
            if let Some(id) = subs.get(&record.cid()) {
                record.off(*id);
            }
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("main_index", &self.main_index)
            .field("indexes", &self.declared)
            .field("len", &self.len())
            .field("comparator", &*self.comparator.borrow())
            .finish()
    }
}
