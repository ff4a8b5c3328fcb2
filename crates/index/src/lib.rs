//! Sift Index - Index maintenance for Sift views.
//!
//! This crate provides `IndexTables`: one hash table per declared index
//! attribute, plus the reserved primary-key and identity (`cid`) tables.
//! Views keep their tables in lockstep with their member sequence and use
//! them for O(1) membership tests and point lookups.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use sift_core::{next_cid, Cid, Entity, Value};
//! use sift_index::{IndexTables, Query};
//!
//! struct User {
//!     cid: Cid,
//!     id: i64,
//! }
//!
//! impl Entity for User {
//!     fn cid(&self) -> Cid {
//!         self.cid
//!     }
//!
//!     fn attribute(&self, name: &str) -> Value {
//!         match name {
//!             "id" => Value::Int64(self.id),
//!             _ => Value::Null,
//!         }
//!     }
//! }
//!
//! let mut tables: IndexTables<User> = IndexTables::new("id", &[] as &[&str]);
//! let user = Rc::new(User { cid: next_cid(), id: 42 });
//! tables.add(&user);
//!
//! assert!(tables.contains(&user));
//! assert!(tables.lookup(&Query::Key(Value::Int64(42)), None).is_some());
//! ```

#![no_std]

extern crate alloc;

pub mod stats;
pub mod tables;

pub use stats::IndexStats;
pub use tables::{IndexTables, Query};
