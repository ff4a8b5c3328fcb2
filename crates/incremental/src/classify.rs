//! Classification of source mutations.
//!
//! Every mutation a source reports is reduced to one `Action` against the
//! view's current membership, plus a decision about re-sorting. This is the
//! path that keeps the view from recomputing on every change.

use crate::predicate::Comparator;
use crate::spec::FilterSet;
use sift_core::{Entity, Mutation, MutationKind, MutationOptions};

/// What a mutation does to a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Insert the entity.
    Add,
    /// Delete the entity if it is a member.
    Remove,
    /// Recompute from scratch.
    Reset,
    /// Re-sort and forward the source's `sort`.
    Sort,
    /// Forward the mutation to listeners.
    Bubble,
    /// Nothing to do.
    Ignore,
}

/// Whether the view re-sorts after handling a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resort {
    /// Order is unaffected.
    No,
    /// Re-sort in place now.
    Now,
    /// A `sort` from the source batch will follow; wait for it.
    Deferred,
}

/// The outcome of classifying one mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub action: Action,
    pub resort: Resort,
    /// An inserted entity may be appended; the source will send `sort`.
    pub batched_sort: bool,
}

/// Returns true if a `sort` from the source is expected after this mutation.
///
/// An explicit `sort_pending` flag wins. Otherwise a bulk `add`/`remove`
/// under a sorted source, with no explicit position and sorting not opted
/// out, is taken to be followed by the source's own `sort`.
pub fn batched_sort(kind: &MutationKind, options: &MutationOptions, source_sorted: bool) -> bool {
    if let Some(pending) = options.sort_pending {
        return pending;
    }
    match kind {
        MutationKind::Add | MutationKind::Remove => {
            source_sorted && options.at.is_none() && options.sort != Some(false)
        }
        _ => false,
    }
}

/// Returns true if a re-sort for a new entity should wait for the batch.
fn defer_for_new<E: Entity>(options: &MutationOptions, entity: Option<&E>) -> bool {
    match options.sort_pending {
        Some(pending) => pending,
        None => options.add && options.remove && entity.map(|e| e.is_new()).unwrap_or(false),
    }
}

/// Classifies a mutation.
///
/// `present` is the entity's membership before the mutation is applied.
pub fn classify<E: Entity>(
    mutation: &Mutation<E>,
    filters: &FilterSet<E>,
    source_comparator: Option<&Comparator<E>>,
    present: bool,
) -> Classification {
    let kind = &mutation.kind;
    let entity = mutation.entity().map(|e| &**e);
    let changed = kind.attribute();
    let batched = batched_sort(kind, &mutation.options, source_comparator.is_some());

    let retest = changed
        .map(|attr| filters.is_watched(attr) || filters.comparator_attribute() == Some(attr))
        .unwrap_or(false);

    let action = match (entity, kind) {
        (Some(e), _) if retest => match (present, filters.test(e)) {
            (false, true) => Action::Add,
            (true, false) => Action::Remove,
            // Still a member: listeners see the change
            (true, true) => Action::Bubble,
            (false, false) => Action::Ignore,
        },
        (Some(e), MutationKind::Add) => {
            if !present && filters.test(e) {
                Action::Add
            } else {
                Action::Ignore
            }
        }
        (None, MutationKind::Add) => Action::Ignore,
        (_, MutationKind::Remove) => Action::Remove,
        (_, MutationKind::Reset) => Action::Reset,
        (_, MutationKind::Sort) => Action::Sort,
        (_, k) if k.is_change() && !present => Action::Ignore,
        _ => Action::Bubble,
    };

    let resort = match action {
        Action::Sort => Resort::Now,
        Action::Bubble | Action::Ignore => match changed {
            Some(attr)
                if !batched && affects_order(attr, filters, source_comparator, present) =>
            {
                if defer_for_new(&mutation.options, entity) {
                    Resort::Deferred
                } else {
                    Resort::Now
                }
            }
            _ => Resort::No,
        },
        _ => Resort::No,
    };

    Classification {
        action,
        resort,
        batched_sort: batched && *kind == MutationKind::Add,
    }
}

/// Returns true if a change to `attribute` calls for a re-sort.
///
/// A named comparator attribute always does, member or not. Function
/// comparators only react to watched changes on members.
fn affects_order<E>(
    attribute: &str,
    filters: &FilterSet<E>,
    source_comparator: Option<&Comparator<E>>,
    member: bool,
) -> bool {
    if let Some(local) = filters.comparator() {
        match local.as_attribute() {
            Some(name) if name == attribute => return true,
            // Functions may read anything the view watches
            None if member && filters.is_watched(attribute) => return true,
            _ => {}
        }
    }
    source_comparator.and_then(|c| c.as_attribute()) == Some(attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ViewSpec;
    use sift_core::{next_cid, Cid, Value};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Toy {
        cid: Cid,
        size: Cell<i64>,
        fresh: bool,
    }

    impl Entity for Toy {
        fn cid(&self) -> Cid {
            self.cid
        }

        fn attribute(&self, name: &str) -> Value {
            match name {
                "size" => Value::Int64(self.size.get()),
                _ => Value::Null,
            }
        }

        fn is_new(&self) -> bool {
            self.fresh
        }
    }

    fn toy(size: i64) -> Rc<Toy> {
        Rc::new(Toy {
            cid: next_cid(),
            size: Cell::new(size),
            fresh: false,
        })
    }

    fn big_only() -> FilterSet<Toy> {
        let mut set = FilterSet::new();
        set.apply(ViewSpec::new().filter(|t: &Toy| t.size.get() > 5).watch(["size"]));
        set
    }

    fn mutation(kind: MutationKind, e: &Rc<Toy>, options: MutationOptions) -> Mutation<Toy> {
        Mutation::new(kind, Rc::clone(e), options)
    }

    fn size_changed() -> MutationKind {
        MutationKind::ChangeAttribute("size".into())
    }

    #[test]
    fn test_batched_sort_inference() {
        let add = MutationKind::Add;
        let bulk = MutationOptions::bulk_add();

        assert!(batched_sort(&add, &bulk, true));
        assert!(!batched_sort(&add, &bulk, false));
        assert!(!batched_sort(&add, &bulk.clone().at(3), true));
        assert!(!batched_sort(&add, &bulk.clone().sort(false), true));
        assert!(!batched_sort(&size_changed(), &bulk, true));
    }

    #[test]
    fn test_batched_sort_explicit_flag_wins() {
        let add = MutationKind::Add;
        assert!(!batched_sort(&add, &MutationOptions::bulk_add().sort_pending(false), true));
        assert!(batched_sort(&add, &MutationOptions::new().sort_pending(true), false));
        assert!(batched_sort(&size_changed(), &MutationOptions::new().sort_pending(true), false));
    }

    #[test]
    fn test_add_passes_filter() {
        let filters = big_only();
        let big = toy(9);
        let small = toy(1);

        let c = classify(&mutation(MutationKind::Add, &big, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Add);
        assert!(!c.batched_sort);

        let c = classify(&mutation(MutationKind::Add, &small, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);

        // Already a member
        let c = classify(&mutation(MutationKind::Add, &big, MutationOptions::new()), &filters, None, true);
        assert_eq!(c.action, Action::Ignore);
    }

    #[test]
    fn test_bulk_add_under_sorted_source_is_batched() {
        let filters = big_only();
        let big = toy(9);
        let source_cmp = Comparator::attribute("size");

        let c = classify(
            &mutation(MutationKind::Add, &big, MutationOptions::bulk_add()),
            &filters,
            Some(&source_cmp),
            false,
        );
        assert_eq!(c.action, Action::Add);
        assert!(c.batched_sort);
    }

    #[test]
    fn test_watched_change_moves_membership() {
        let filters = big_only();
        let t = toy(9);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Add);

        t.size.set(2);
        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, true);
        assert_eq!(c.action, Action::Remove);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);
    }

    #[test]
    fn test_change_of_non_member_is_ignored() {
        let filters = FilterSet::new();
        let t = toy(1);
        let name_changed = MutationKind::ChangeAttribute("name".into());

        let c = classify(&mutation(name_changed.clone(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);
        let c = classify(&mutation(MutationKind::Change, &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);

        let c = classify(&mutation(name_changed, &t, MutationOptions::new()), &filters, None, true);
        assert_eq!(c.action, Action::Bubble);
        assert_eq!(c.resort, Resort::No);
    }

    #[test]
    fn test_custom_events_bubble() {
        let filters = FilterSet::new();
        let t = toy(1);
        let ping = MutationKind::Custom("ping".into());

        let c = classify(&mutation(ping, &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Bubble);
    }

    #[test]
    fn test_collection_events() {
        let filters: FilterSet<Toy> = FilterSet::new();
        let reset = Mutation::collection(MutationKind::Reset, MutationOptions::new());
        let sort = Mutation::collection(MutationKind::Sort, MutationOptions::new());

        assert_eq!(classify(&reset, &filters, None, false).action, Action::Reset);
        let c = classify(&sort, &filters, None, false);
        assert_eq!(c.action, Action::Sort);
        assert_eq!(c.resort, Resort::Now);
    }

    #[test]
    fn test_comparator_attribute_change_resorts_member() {
        let mut filters = FilterSet::new();
        filters.apply(ViewSpec::new().comparator("size"));
        let t = toy(4);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, true);
        assert_eq!(c.action, Action::Bubble);
        assert_eq!(c.resort, Resort::Now);

        // Joining the view places it; no separate re-sort
        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Add);
        assert_eq!(c.resort, Resort::No);
    }

    #[test]
    fn test_comparator_attribute_change_of_non_member_resorts() {
        let mut filters = big_only();
        filters.apply(ViewSpec::new().comparator("size"));
        let t = toy(2);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);
        assert_eq!(c.resort, Resort::Now);

        // Unrelated attributes of non-members stay ignored
        let name_changed = MutationKind::ChangeAttribute("name".into());
        let c = classify(&mutation(name_changed, &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.resort, Resort::No);
    }

    #[test]
    fn test_key_comparator_ignores_watched_change_of_non_member() {
        let mut filters = big_only();
        filters.apply(
            ViewSpec::new().comparator(Comparator::key(|t: &Toy| Value::Int64(t.size.get()))),
        );
        let t = toy(2);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, false);
        assert_eq!(c.action, Action::Ignore);
        assert_eq!(c.resort, Resort::No);
    }

    #[test]
    fn test_source_comparator_attribute_change_resorts() {
        let filters = FilterSet::new();
        let source_cmp = Comparator::attribute("size");
        let t = toy(4);

        let c = classify(
            &mutation(size_changed(), &t, MutationOptions::new()),
            &filters,
            Some(&source_cmp),
            true,
        );
        assert_eq!(c.action, Action::Bubble);
        assert_eq!(c.resort, Resort::Now);

        // Explicitly announced sort: nothing to do now
        let c = classify(
            &mutation(size_changed(), &t, MutationOptions::new().sort_pending(true)),
            &filters,
            Some(&source_cmp),
            true,
        );
        assert_eq!(c.resort, Resort::No);
    }

    #[test]
    fn test_key_comparator_resorts_on_watched_change() {
        let mut filters = FilterSet::new();
        filters.apply(
            ViewSpec::new()
                .comparator(Comparator::key(|t: &Toy| Value::Int64(-t.size.get())))
                .watch(["size"]),
        );
        let t = toy(4);

        let c = classify(&mutation(size_changed(), &t, MutationOptions::new()), &filters, None, true);
        assert_eq!(c.action, Action::Bubble);
        assert_eq!(c.resort, Resort::Now);
    }

    #[test]
    fn test_new_entity_in_set_batch_waits_for_sort() {
        let mut filters = FilterSet::new();
        filters.apply(ViewSpec::new().comparator("size"));
        let fresh = Rc::new(Toy {
            cid: next_cid(),
            size: Cell::new(3),
            fresh: true,
        });

        let c = classify(
            &mutation(size_changed(), &fresh, MutationOptions::batch_set()),
            &filters,
            None,
            true,
        );
        assert_eq!(c.resort, Resort::Deferred);

        // Same batch flags, but the entity is not new
        let old = toy(3);
        let c = classify(
            &mutation(size_changed(), &old, MutationOptions::batch_set()),
            &filters,
            None,
            true,
        );
        assert_eq!(c.resort, Resort::Now);
    }
}
