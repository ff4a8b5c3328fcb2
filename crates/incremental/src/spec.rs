//! View configuration.
//!
//! A `ViewSpec` is the declarative description of a view: equality
//! constraints, predicate filters, a sort rule and watched attributes.
//! A `FilterSet` is the live state a view holds after applying specs.

use crate::predicate::{Comparator, Predicate};
use serde::Deserialize;
use sift_core::{Entity, Error, Result, Value};

/// Declarative configuration for a view.
pub struct ViewSpec<E> {
    where_eq: Vec<(String, Value)>,
    filters: Vec<Predicate<E>>,
    comparator: Option<Comparator<E>>,
    watched: Vec<String>,
}

impl<E> Default for ViewSpec<E> {
    fn default() -> Self {
        Self {
            where_eq: Vec::new(),
            filters: Vec::new(),
            comparator: None,
            watched: Vec::new(),
        }
    }
}

impl<E> Clone for ViewSpec<E> {
    fn clone(&self) -> Self {
        Self {
            where_eq: self.where_eq.clone(),
            filters: self.filters.clone(),
            comparator: self.comparator.clone(),
            watched: self.watched.clone(),
        }
    }
}

impl<E> std::fmt::Debug for ViewSpec<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSpec")
            .field("where", &self.where_eq)
            .field("filters", &self.filters.len())
            .field("comparator", &self.comparator)
            .field("watched", &self.watched)
            .finish()
    }
}

impl<E> ViewSpec<E> {
    /// Creates an empty spec: everything passes, no local sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `attribute == value`. The attribute is watched.
    pub fn where_eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.where_eq.push((attribute.into(), value.into()));
        self
    }

    /// Adds a predicate filter.
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> bool + 'static,
    {
        self.filters.push(Predicate::new(f));
        self
    }

    /// Adds existing predicate handles, keeping their identity.
    pub fn filters(mut self, predicates: impl IntoIterator<Item = Predicate<E>>) -> Self {
        self.filters.extend(predicates);
        self
    }

    /// Sets the local sort rule.
    pub fn comparator(mut self, comparator: impl Into<Comparator<E>>) -> Self {
        self.comparator = Some(comparator.into());
        self
    }

    /// Watches attributes whose change re-tests membership.
    pub fn watch<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watched.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Returns true if this spec constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.where_eq.is_empty()
            && self.filters.is_empty()
            && self.comparator.is_none()
            && self.watched.is_empty()
    }

    /// Checks attribute names.
    pub fn validate(&self) -> Result<()> {
        if let Some((_, value)) = self.where_eq.iter().find(|(name, _)| name.is_empty()) {
            return Err(Error::invalid_spec(format!(
                "empty attribute name in where clause (value {})",
                value
            )));
        }
        if self.watched.iter().any(|name| name.is_empty()) {
            return Err(Error::invalid_spec("empty attribute name in watched list"));
        }
        if let Some(Comparator::Attribute(name)) = &self.comparator {
            if name.is_empty() {
                return Err(Error::invalid_spec("empty comparator attribute"));
            }
        }
        Ok(())
    }
}

/// The JSON shape accepted by `ViewSpec::from_json`. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSpec {
    #[serde(rename = "where")]
    where_eq: serde_json::Map<String, serde_json::Value>,
    watched: Vec<String>,
    comparator: Option<String>,
}

impl<E> ViewSpec<E> {
    /// Builds a spec from loosely-typed JSON.
    ///
    /// Recognized keys are `where` (object of attribute to scalar),
    /// `watched` (array of names) and `comparator` (attribute name).
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        if !json.is_object() {
            return Err(Error::invalid_spec("expected a JSON object"));
        }
        let raw: RawSpec = serde_json::from_value(json.clone())
            .map_err(|e| Error::invalid_spec(e.to_string()))?;

        let mut spec = Self::new().watch(raw.watched);
        for (name, value) in raw.where_eq {
            let value = json_to_value(&name, value)?;
            spec = spec.where_eq(name, value);
        }
        if let Some(name) = raw.comparator {
            spec.comparator = Some(Comparator::Attribute(name));
        }
        spec.validate()?;
        Ok(spec)
    }
}

fn json_to_value(name: &str, json: serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Boolean(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int64(i)),
            None => n
                .as_f64()
                .map(Value::Float64)
                .ok_or_else(|| Error::invalid_spec(format!("number out of range for {}", name))),
        },
        Json::String(s) => Ok(Value::String(s)),
        Json::Array(_) | Json::Object(_) => Err(Error::invalid_spec(format!(
            "unsupported value for {}: expected a scalar",
            name
        ))),
    }
}

/// One or many predicates, or none given.
///
/// `Omitted` means "not specified": as the old side of a swap it stands for
/// every active predicate, as the new side it adds nothing.
pub enum Filters<E> {
    /// Nothing specified
    Omitted,
    /// An explicit list
    Listed(Vec<Predicate<E>>),
}

impl<E> From<Predicate<E>> for Filters<E> {
    fn from(p: Predicate<E>) -> Self {
        Filters::Listed(vec![p])
    }
}

impl<E> From<&Predicate<E>> for Filters<E> {
    fn from(p: &Predicate<E>) -> Self {
        Filters::Listed(vec![p.clone()])
    }
}

impl<E> From<Vec<Predicate<E>>> for Filters<E> {
    fn from(list: Vec<Predicate<E>>) -> Self {
        Filters::Listed(list)
    }
}

impl<E> From<&[Predicate<E>]> for Filters<E> {
    fn from(list: &[Predicate<E>]) -> Self {
        Filters::Listed(list.to_vec())
    }
}

impl<E> From<Option<Predicate<E>>> for Filters<E> {
    fn from(p: Option<Predicate<E>>) -> Self {
        match p {
            Some(p) => Filters::Listed(vec![p]),
            None => Filters::Omitted,
        }
    }
}

/// The active filtering state of a view.
pub struct FilterSet<E> {
    filters: Vec<Predicate<E>>,
    watched: Vec<String>,
    comparator: Option<Comparator<E>>,
}

impl<E> Default for FilterSet<E> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            watched: Vec::new(),
            comparator: None,
        }
    }
}

impl<E> FilterSet<E> {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active predicates in insertion order.
    pub fn filters(&self) -> &[Predicate<E>] {
        &self.filters
    }

    /// Returns the watched attributes in insertion order.
    pub fn watched(&self) -> &[String] {
        &self.watched
    }

    /// Returns the local sort rule.
    pub fn comparator(&self) -> Option<&Comparator<E>> {
        self.comparator.as_ref()
    }

    /// Replaces the local sort rule.
    pub fn set_comparator(&mut self, comparator: Option<Comparator<E>>) {
        self.comparator = comparator;
    }

    /// Appends a predicate.
    pub fn add(&mut self, predicate: Predicate<E>) {
        self.filters.push(predicate);
    }

    /// Removes the first handle identical to `predicate`.
    pub fn remove(&mut self, predicate: &Predicate<E>) -> bool {
        match self.filters.iter().position(|p| p.ptr_eq(predicate)) {
            Some(i) => {
                self.filters.remove(i);
                true
            }
            None => false,
        }
    }

    /// Removes `old` (every predicate when omitted), then adds `new`.
    pub fn swap(&mut self, new: Filters<E>, old: Filters<E>) {
        match old {
            Filters::Omitted => self.filters.clear(),
            Filters::Listed(old) => {
                for p in &old {
                    self.remove(p);
                }
            }
        }
        if let Filters::Listed(new) = new {
            self.filters.extend(new);
        }
    }

    /// Empties predicates and watched attributes, optionally the sort rule.
    pub fn reset(&mut self, reset_comparator: bool) {
        self.filters.clear();
        self.watched.clear();
        if reset_comparator {
            self.comparator = None;
        }
    }

    /// Adds watched attributes, keeping the set duplicate-free.
    pub fn watch<I, S>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for attr in attributes {
            let attr = attr.into();
            if !self.watched.contains(&attr) {
                self.watched.push(attr);
            }
        }
    }

    /// Removes watched attributes.
    pub fn unwatch<I, S>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for attr in attributes {
            self.watched.retain(|w| w != attr.as_ref());
        }
    }

    /// Returns true if a change to `attribute` re-tests membership.
    pub fn is_watched(&self, attribute: &str) -> bool {
        self.watched.iter().any(|w| w == attribute)
    }

    /// Returns the attribute of an attribute-name sort rule.
    pub fn comparator_attribute(&self) -> Option<&str> {
        self.comparator.as_ref().and_then(|c| c.as_attribute())
    }
}

impl<E: Entity> FilterSet<E> {
    /// Merges a spec into this set.
    ///
    /// The comparator is replaced only if the spec carries one.
    pub fn apply(&mut self, spec: ViewSpec<E>) {
        let ViewSpec {
            where_eq,
            filters,
            comparator,
            watched,
        } = spec;

        self.watch(watched);
        if comparator.is_some() {
            self.comparator = comparator;
        }
        let keys: Vec<String> = where_eq.iter().map(|(name, _)| name.clone()).collect();
        for (name, value) in where_eq {
            self.filters.push(Predicate::equals(name, value));
        }
        self.watch(keys);
        self.filters.extend(filters);
    }

    /// Returns true if `entity` passes every predicate.
    #[inline]
    pub fn test(&self, entity: &E) -> bool {
        self.filters.iter().all(|p| p.test(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::{next_cid, Cid};

    struct Pet {
        cid: Cid,
        kind: &'static str,
        age: i64,
    }

    impl Entity for Pet {
        fn cid(&self) -> Cid {
            self.cid
        }

        fn attribute(&self, name: &str) -> Value {
            match name {
                "kind" => Value::from(self.kind),
                "age" => Value::Int64(self.age),
                _ => Value::Null,
            }
        }
    }

    fn pet(kind: &'static str, age: i64) -> Pet {
        Pet {
            cid: next_cid(),
            kind,
            age,
        }
    }

    #[test]
    fn test_apply_where_watches_keys() {
        let mut set = FilterSet::new();
        set.apply(ViewSpec::new().watch(["age"]).where_eq("kind", "cat").where_eq("age", 3));

        assert_eq!(set.watched(), ["age", "kind"]);
        assert_eq!(set.filters().len(), 2);
        assert!(set.test(&pet("cat", 3)));
        assert!(!set.test(&pet("dog", 3)));
        assert!(!set.test(&pet("cat", 4)));
    }

    #[test]
    fn test_watched_is_a_copy() {
        let watched = vec!["name".to_string(), "age".to_string()];
        let mut set: FilterSet<Pet> = FilterSet::new();
        set.apply(ViewSpec::new().watch(watched.clone()));
        set.watch(["extra"]);

        assert_eq!(watched.len(), 2);
        assert_eq!(set.watched(), ["name", "age", "extra"]);
    }

    #[test]
    fn test_empty_set_passes_everything() {
        let set: FilterSet<Pet> = FilterSet::new();
        assert!(set.test(&pet("fish", 0)));
    }

    #[test]
    fn test_reset_keeps_comparator_unless_asked() {
        let mut set: FilterSet<Pet> = FilterSet::new();
        set.apply(
            ViewSpec::new()
                .comparator("age")
                .where_eq("kind", "cat")
                .watch(["age"]),
        );

        set.reset(false);
        assert!(set.filters().is_empty());
        assert!(set.watched().is_empty());
        assert_eq!(set.comparator_attribute(), Some("age"));

        set.reset(true);
        assert!(set.comparator().is_none());
    }

    #[test]
    fn test_remove_by_identity() {
        let old = Predicate::new(|p: &Pet| p.age > 1);
        let twin = Predicate::new(|p: &Pet| p.age > 1);
        let mut set = FilterSet::new();
        set.add(old.clone());

        assert!(!set.remove(&twin));
        assert_eq!(set.filters().len(), 1);
        assert!(set.remove(&old));
        assert!(set.filters().is_empty());
        assert!(!set.remove(&old));
    }

    #[test]
    fn test_swap_omitted_replaces_all() {
        let a = Predicate::new(|p: &Pet| p.age > 1);
        let b = Predicate::new(|p: &Pet| p.age < 9);
        let c = Predicate::new(|p: &Pet| p.kind == "cat");
        let mut set = FilterSet::new();
        set.add(a.clone());
        set.add(b.clone());

        set.swap(Filters::from(&c), Filters::from(&a));
        assert_eq!(set.filters(), [b.clone(), c.clone()]);

        set.swap(Filters::from(&a), Filters::Omitted);
        assert_eq!(set.filters(), [a.clone()]);

        set.swap(Filters::Omitted, Filters::from(vec![a]));
        assert!(set.filters().is_empty());
    }

    #[test]
    fn test_from_json() {
        let spec: ViewSpec<Pet> = ViewSpec::from_json(&json!({
            "where": { "kind": "cat", "age": 2 },
            "watched": ["name"],
            "comparator": "age",
            "limit": 10
        }))
        .unwrap();

        let mut set = FilterSet::new();
        set.apply(spec);
        assert_eq!(set.comparator_attribute(), Some("age"));
        assert!(set.is_watched("name"));
        assert!(set.is_watched("kind"));
        assert!(set.test(&pet("cat", 2)));
        assert!(!set.test(&pet("cat", 5)));
    }

    #[test]
    fn test_from_json_rejects_bad_shapes() {
        assert!(ViewSpec::<Pet>::from_json(&json!([1, 2])).is_err());
        assert!(ViewSpec::<Pet>::from_json(&json!({ "where": { "kind": [1] } })).is_err());
        assert!(ViewSpec::<Pet>::from_json(&json!({ "watched": "name" })).is_err());

        let err = ViewSpec::<Pet>::from_json(&json!({ "where": { "": 1 } })).unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { .. }));
    }

    #[test]
    fn test_validate() {
        assert!(ViewSpec::<Pet>::new().validate().is_ok());
        assert!(ViewSpec::<Pet>::new().watch([""]).validate().is_err());
        assert!(ViewSpec::<Pet>::new().comparator("").validate().is_err());
        assert!(ViewSpec::<Pet>::new().is_empty());
    }
}
