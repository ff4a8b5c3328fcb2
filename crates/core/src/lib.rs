//! Sift Core - Core types shared by every Sift crate.
//!
//! This crate provides the foundational types for Sift views:
//!
//! - `Value`: Attribute values (ordered, hashable)
//! - `Entity`: The capability entities expose (identity + attribute access)
//! - `Mutation`: Change notifications delivered by source collections
//! - `Error`: Error types for boundary validation
//!
//! # Example
//!
//! ```rust
//! use sift_core::{next_cid, Cid, Entity, Value};
//!
//! struct Widget {
//!     cid: Cid,
//!     name: String,
//! }
//!
//! impl Entity for Widget {
//!     fn cid(&self) -> Cid {
//!         self.cid
//!     }
//!
//!     fn attribute(&self, name: &str) -> Value {
//!         match name {
//!             "name" => Value::from(self.name.as_str()),
//!             _ => Value::Null,
//!         }
//!     }
//! }
//!
//! let w = Widget { cid: next_cid(), name: "gear".into() };
//! assert_eq!(w.attribute("name"), Value::from("gear"));
//! assert!(w.attribute("missing").is_null());
//! ```

#![no_std]

extern crate alloc;

mod entity;
mod error;
mod mutation;
mod value;

pub use entity::{next_cid, reserve_cids, Cid, Entity, CID_INDEX, DEFAULT_MAIN_INDEX};
pub use error::{Error, Result};
pub use mutation::{Mutation, MutationKind, MutationOptions};
pub use value::Value;
