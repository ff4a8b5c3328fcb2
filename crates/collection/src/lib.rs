//! Sift Collection - Observable records and collections for Sift views.
//!
//! This crate provides a ready-made `Source` for `sift-incremental`:
//!
//! - `Record`: An attribute map that announces its own changes
//! - `Collection`: An ordered, indexed set of records that republishes record
//!   events and reports its own adds, removes, resets and sorts
//!
//! # Example
//!
//! ```rust
//! use sift_collection::{Collection, CollectionOptions, Record};
//! use sift_core::Value;
//!
//! let widgets = Collection::new(CollectionOptions::new().comparator("rank"));
//! widgets.add([
//!     Record::from_pairs([("id", Value::from(1)), ("rank", Value::from(2))]),
//!     Record::from_pairs([("id", Value::from(2)), ("rank", Value::from(1))]),
//! ]);
//!
//! assert_eq!(widgets.at(0).map(|w| w.get("id")), Some(Value::from(2)));
//! ```

mod collection;
mod json;
mod record;

pub use collection::{AddOptions, Collection, CollectionOptions};
pub use json::{json_to_value, value_to_json};
pub use record::{Record, RecordEvent};
