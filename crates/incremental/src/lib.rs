//! Sift Incremental - Incrementally maintained views over observable collections.
//!
//! A `FilteredView` follows a source collection and keeps the members that
//! pass its filters, in the order of its sort rule, indexed by the source's
//! index attributes. Each source mutation is classified against the view's
//! current membership and handled with a targeted insert, delete or re-sort;
//! a full recompute happens only when nothing cheaper is correct.
//!
//! # Core Concepts
//!
//! - `Source<E>`: The collection contract a view consumes
//! - `ViewSpec<E>`: Declarative configuration (equality constraints,
//!   predicates, sort rule, watched attributes)
//! - `FilterSet<E>`: The live filtering state of a view
//! - `classify`: Reduces a source mutation to an `Action`
//! - `ViewState<E>`: Derived sequence and index tables, full and incremental
//!   reconciliation
//! - `FilteredView<E>`: The public handle
//!
//! # Example
//!
//! ```ignore
//! use sift_collection::{Collection, CollectionOptions, Record};
//! use sift_incremental::{FilteredView, ViewSpec};
//!
//! let widgets = Collection::new(CollectionOptions::new().comparator("awesomeness"));
//! let sweet = FilteredView::new(widgets.clone(), ViewSpec::new().where_eq("sweet", true))?;
//!
//! sweet.on("add", |event| println!("{:?}", event));
//! widgets.add(vec![Record::from_pairs([("id", 1.into()), ("sweet", true.into())])]);
//! assert_eq!(sweet.len(), 1);
//! ```

pub mod classify;
pub mod event;
pub mod predicate;
pub mod reconcile;
pub mod source;
pub mod spec;
pub mod stats;
pub mod view;

pub use classify::{batched_sort, classify, Action, Classification, Resort};
pub use event::ViewEvent;
pub use predicate::{Comparator, Predicate};
pub use reconcile::ViewState;
pub use source::{Source, SourceListener};
pub use spec::{FilterSet, Filters, ViewSpec};
pub use stats::ViewStats;
pub use view::FilteredView;

// Re-export commonly used types from dependencies
pub use sift_core::{Entity, Error, Mutation, MutationKind, MutationOptions, Result, Value};
pub use sift_index::Query;
pub use sift_reactive::{Emitter, Event, EventBus, SubscriptionId, Topic};
