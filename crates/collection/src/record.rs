//! Observable records.
//!
//! A `Record` is an attribute map with a stable `cid`. Setting an attribute
//! to a different value notifies listeners with `change:<name>` followed by
//! `change`; listeners run after the record has been updated.

use crate::json::{json_to_value, value_to_json};
use sift_core::{next_cid, Cid, Entity, Error, MutationKind, Result, Value, DEFAULT_MAIN_INDEX};
use sift_reactive::{Emitter, Event, EventBus, SubscriptionId, Topic};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

/// A notification raised by a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordEvent {
    pub kind: MutationKind,
}

impl Event for RecordEvent {
    fn name(&self) -> Cow<'_, str> {
        self.kind.name()
    }
}

/// An observable entity backed by an attribute map.
pub struct Record {
    cid: Cid,
    attributes: RefCell<BTreeMap<String, Value>>,
    events: EventBus<RecordEvent>,
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Record {
    /// Creates a record with no attributes.
    pub fn new() -> Self {
        Self {
            cid: next_cid(),
            attributes: RefCell::new(BTreeMap::new()),
            events: EventBus::new(),
        }
    }

    /// Creates a record from attribute pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let record = Self::new();
        {
            let mut attrs = record.attributes.borrow_mut();
            for (name, value) in pairs {
                if !value.is_null() {
                    attrs.insert(name.into(), value);
                }
            }
        }
        record
    }

    /// Creates a record from a JSON object of scalars.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::invalid_operation("a record must be a JSON object"))?;
        let pairs = object
            .iter()
            .map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_pairs(pairs))
    }

    /// Reads an attribute.
    pub fn get(&self, name: &str) -> Value {
        self.attributes.borrow().get(name).cloned().unwrap_or(Value::Null)
    }

    /// Returns true if the attribute holds a value.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.borrow().contains_key(name)
    }

    /// Returns a copy of every attribute.
    pub fn attributes(&self) -> BTreeMap<String, Value> {
        self.attributes.borrow().clone()
    }

    /// Sets an attribute. Returns true if the value changed.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let changed = {
            let mut attrs = self.attributes.borrow_mut();
            if value.is_null() {
                attrs.remove(name).is_some()
            } else {
                match attrs.get(name) {
                    Some(old) if *old == value => false,
                    _ => {
                        attrs.insert(name.to_string(), value);
                        true
                    }
                }
            }
        };
        if changed {
            self.emit_changes(&[name]);
        }
        changed
    }

    /// Sets several attributes, then notifies once per changed attribute and
    /// once with `change`. Returns the names that changed.
    pub fn set_all<I, K>(&self, pairs: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut changed = Vec::new();
        {
            let mut attrs = self.attributes.borrow_mut();
            for (name, value) in pairs {
                let name = name.into();
                let differs = attrs.get(&name).cloned().unwrap_or(Value::Null) != value;
                if !differs {
                    continue;
                }
                if value.is_null() {
                    attrs.remove(&name);
                } else {
                    attrs.insert(name.clone(), value);
                }
                changed.push(name);
            }
        }
        if !changed.is_empty() {
            let names: Vec<&str> = changed.iter().map(String::as_str).collect();
            self.emit_changes(&names);
        }
        changed
    }

    /// Removes an attribute. Returns true if it was set.
    pub fn unset(&self, name: &str) -> bool {
        self.set(name, Value::Null)
    }

    /// Raises a named event, e.g. a custom `ping`.
    pub fn trigger(&self, name: &str) {
        self.events.emit(&RecordEvent {
            kind: MutationKind::parse(name),
        });
    }

    /// Subscribes to this record's events.
    pub fn on<F>(&self, topic: impl Into<Topic>, listener: F) -> SubscriptionId
    where
        F: Fn(&RecordEvent) + 'static,
    {
        self.events.subscribe(topic.into(), listener)
    }

    /// Unsubscribes from this record's events.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    /// Returns the attributes as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let attrs = self.attributes.borrow();
        let object: serde_json::Map<String, serde_json::Value> = attrs
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect();
        serde_json::Value::Object(object)
    }

    fn emit_changes(&self, names: &[&str]) {
        for name in names {
            self.events.emit(&RecordEvent {
                kind: MutationKind::ChangeAttribute((*name).to_string()),
            });
        }
        self.events.emit(&RecordEvent {
            kind: MutationKind::Change,
        });
    }
}

impl Entity for Record {
    fn cid(&self) -> Cid {
        self.cid
    }

    fn attribute(&self, name: &str) -> Value {
        self.get(name)
    }

    /// A record without a primary key has never been stored.
    fn is_new(&self) -> bool {
        !self.has(DEFAULT_MAIN_INDEX)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("cid", &self.cid)
            .field("attributes", &*self.attributes.borrow())
            .finish()
    }
}
