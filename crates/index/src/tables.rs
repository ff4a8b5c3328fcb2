//! Index tables for Sift views.
//!
//! An `IndexTables` keeps one hash map per declared index attribute, one for
//! the primary key and one for the identity (`cid`). Every map mirrors the
//! same set of member entities, which gives O(1) membership tests and point
//! lookups by any indexed attribute.

use crate::stats::IndexStats;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use sift_core::{Cid, Entity, Value, CID_INDEX};
use hashbrown::HashMap;

/// A lookup request against index tables.
#[derive(Debug)]
pub enum Query<'q, E> {
    /// Look up an attribute value.
    Key(Value),
    /// Look up an identity.
    Cid(Cid),
    /// Look up the indexed counterpart of an entity-like object.
    Entity(&'q E),
}

impl<E> Clone for Query<'_, E> {
    fn clone(&self) -> Self {
        match self {
            Query::Key(v) => Query::Key(v.clone()),
            Query::Cid(c) => Query::Cid(*c),
            Query::Entity(e) => Query::Entity(*e),
        }
    }
}

impl<E> From<Value> for Query<'_, E> {
    fn from(v: Value) -> Self {
        Query::Key(v)
    }
}

impl<'q, E> From<&'q E> for Query<'q, E> {
    fn from(entity: &'q E) -> Self {
        Query::Entity(entity)
    }
}

/// Hash index tables over a set of entities.
pub struct IndexTables<E> {
    /// Name of the primary key attribute.
    main_index: String,
    /// Attribute names with a value table (declared indexes + primary key).
    names: Vec<String>,
    /// Attribute name -> value -> entity.
    tables: HashMap<String, HashMap<Value, Rc<E>>>,
    /// Identity table.
    cids: HashMap<Cid, Rc<E>>,
    /// Keys recorded per entity when it was indexed.
    keys: HashMap<Cid, Vec<(usize, Value)>>,
    /// Statistics for these tables.
    stats: IndexStats,
}

impl<E: Entity> IndexTables<E> {
    /// Creates empty tables for the given primary key and declared indexes.
    ///
    /// Declared names are de-duplicated; `cid` is always reserved for the
    /// identity table.
    pub fn new<S: AsRef<str>>(main_index: &str, declared: &[S]) -> Self {
        let mut names: Vec<String> = Vec::with_capacity(declared.len() + 1);
        for name in declared.iter().map(|s| s.as_ref()).chain(core::iter::once(main_index)) {
            if name != CID_INDEX && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        let tables = names.iter().map(|n| (n.clone(), HashMap::new())).collect();
        Self {
            main_index: main_index.to_string(),
            names,
            tables,
            cids: HashMap::new(),
            keys: HashMap::new(),
            stats: IndexStats::new(),
        }
    }

    /// Creates empty tables with the same declaration as `self`.
    pub fn fresh(&self) -> Self {
        Self::new(&self.main_index, &self.names)
    }

    /// Drops every entry, keeping the declaration.
    pub fn reset(&mut self) {
        for table in self.tables.values_mut() {
            table.clear();
        }
        self.cids.clear();
        self.keys.clear();
        self.stats.clear();
    }

    /// Returns the primary key attribute name.
    #[inline]
    pub fn main_index(&self) -> &str {
        &self.main_index
    }

    /// Returns every index name, including the reserved identity index.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .map(|n| n.as_str())
            .chain(core::iter::once(CID_INDEX))
    }

    /// Returns true if `attribute` keys a value table.
    pub fn is_indexed(&self, attribute: &str) -> bool {
        self.names.iter().any(|n| n == attribute)
    }

    /// Returns the number of indexed entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.cids.len()
    }

    /// Returns true if no entity is indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    /// Returns the statistics for these tables.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Returns the value table for an attribute.
    pub fn table(&self, name: &str) -> Option<&HashMap<Value, Rc<E>>> {
        self.tables.get(name)
    }

    /// Returns the identity table.
    pub fn cid_table(&self) -> &HashMap<Cid, Rc<E>> {
        &self.cids
    }

    /// Returns true if this exact entity is indexed.
    #[inline]
    pub fn contains(&self, entity: &E) -> bool {
        self.cids.contains_key(&entity.cid())
    }

    /// Indexes an entity under every non-empty indexed value.
    ///
    /// An entity that is already indexed is re-keyed.
    pub fn add(&mut self, entity: &Rc<E>) {
        let cid = entity.cid();
        if self.keys.contains_key(&cid) {
            self.remove(entity);
        }

        let mut recorded = Vec::with_capacity(self.names.len());
        for (slot, name) in self.names.iter().enumerate() {
            let value = entity.attribute(name);
            if value.is_empty() {
                self.stats.skip();
                continue;
            }
            if let Some(table) = self.tables.get_mut(name) {
                table.insert(value.clone(), Rc::clone(entity));
                recorded.push((slot, value));
            }
        }

        self.stats.add_entity(recorded.len() + 1);
        self.cids.insert(cid, Rc::clone(entity));
        self.keys.insert(cid, recorded);
    }

    /// Removes an entity from every table.
    ///
    /// Keys recorded at insertion time are used, so an entity whose indexed
    /// attributes changed since is still removed completely. Returns true if
    /// the entity was indexed.
    pub fn remove(&mut self, entity: &E) -> bool {
        let cid = entity.cid();
        let Some(recorded) = self.keys.remove(&cid) else {
            return false;
        };

        for (slot, value) in &recorded {
            let name = &self.names[*slot];
            if let Some(table) = self.tables.get_mut(name) {
                // Only drop the entry if it still points at this entity
                if table.get(value).map(|e| e.cid() == cid).unwrap_or(false) {
                    table.remove(value);
                }
            }
        }

        self.cids.remove(&cid);
        self.stats.remove_entity(recorded.len() + 1);
        true
    }

    /// Re-keys an indexed entity after one of its attributes changed.
    ///
    /// Returns false if the entity is not indexed.
    pub fn reindex(&mut self, entity: &Rc<E>) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.add(entity);
        true
    }

    /// Looks up an entity.
    ///
    /// `index` selects the value table, defaulting to the primary key.
    /// An entity-like query is tried by its value for that index, then by its
    /// primary key, then by identity.
    pub fn lookup(&self, query: &Query<'_, E>, index: Option<&str>) -> Option<Rc<E>> {
        let name = index.unwrap_or(self.main_index.as_str());
        match query {
            Query::Cid(cid) => self.cids.get(cid).cloned(),
            Query::Key(key) => {
                if name == CID_INDEX {
                    return key
                        .as_i64()
                        .and_then(|c| self.cids.get(&(c as Cid)))
                        .cloned();
                }
                self.get_value(name, key)
            }
            Query::Entity(entity) => {
                if name != CID_INDEX {
                    if let Some(found) = self.get_value(name, &entity.attribute(name)) {
                        return Some(found);
                    }
                }
                if name != self.main_index {
                    if let Some(found) =
                        self.get_value(&self.main_index, &entity.attribute(&self.main_index))
                    {
                        return Some(found);
                    }
                }
                self.cids.get(&entity.cid()).cloned()
            }
        }
    }

    fn get_value(&self, name: &str, key: &Value) -> Option<Rc<E>> {
        if key.is_empty() {
            return None;
        }
        self.tables.get(name).and_then(|t| t.get(key)).cloned()
    }
}

impl<E> core::fmt::Debug for IndexTables<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexTables")
            .field("main_index", &self.main_index)
            .field("names", &self.names)
            .field("entities", &self.cids.len())
            .finish()
    }
}
