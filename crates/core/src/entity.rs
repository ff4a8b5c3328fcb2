//! Entity contract for Sift.
//!
//! An entity is an externally owned record with a stable client identity
//! (`cid`) and named attributes. Sift never copies entities; collections and
//! views share them through `Rc`.

use crate::value::Value;
use core::sync::atomic::{AtomicU64, Ordering};

/// Stable client-side identity of an entity.
pub type Cid = u64;

/// Name of the reserved identity index.
pub const CID_INDEX: &str = "cid";

/// Default name of the primary key attribute.
pub const DEFAULT_MAIN_INDEX: &str = "id";

/// Global counter for generating unique client ids.
static NEXT_CID: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique client id.
pub fn next_cid() -> Cid {
    NEXT_CID.fetch_add(1, Ordering::SeqCst)
}

/// Reserves a range of client ids and returns the first one.
pub fn reserve_cids(count: u64) -> Cid {
    NEXT_CID.fetch_add(count, Ordering::SeqCst)
}

/// The capability every entity exposes to collections and views.
pub trait Entity: 'static {
    /// Returns the stable identity of this entity.
    fn cid(&self) -> Cid;

    /// Reads an attribute. Absent attributes read as `Value::Null`.
    fn attribute(&self, name: &str) -> Value;

    /// Returns true for entities that were constructed but never persisted.
    fn is_new(&self) -> bool {
        false
    }
}
