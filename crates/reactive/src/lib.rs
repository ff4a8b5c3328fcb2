//! Sift Reactive - Event routing for Sift incremental views.
//!
//! This crate carries the notification side of a view: the topics listeners
//! subscribe to, the emitter that delivers events, and the change set used to
//! describe how a member list moved between two states.
//!
//! # Core Concepts
//!
//! - `Event`: Anything with a topic name
//! - `Emitter`: The on/off/emit capability a view is built with
//! - `EventBus`: The default, synchronous `Emitter`
//! - `ChangeSet`: Added/removed members between two sequences
//!
//! # Example
//!
//! ```
//! use std::borrow::Cow;
//! use sift_reactive::{Emitter, Event, EventBus, Topic};
//!
//! struct Saved;
//!
//! impl Event for Saved {
//!     fn name(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("saved")
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.subscribe(Topic::named("saved"), |_: &Saved| println!("saved"));
//! bus.emit(&Saved);
//! ```

#![no_std]

extern crate alloc;

pub mod bus;
pub mod change_set;
pub mod event;

pub use bus::{Emitter, EventBus, Listener, SubscriptionId};
pub use change_set::ChangeSet;
pub use event::{Event, Topic};

// Re-export commonly used types from dependencies
pub use sift_core::{Mutation, MutationKind};
