//! Benchmarks for sift-incremental views.
//!
//! Workload: a collection sorted by name, followed by a view of the active
//! records that watches `active`.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use sift_collection::{Collection, CollectionOptions, Record};
use sift_incremental::{FilteredView, Value, ViewSpec};
use std::rc::Rc;

const NAMES: [&str; 5] = ["Cat", "Dog", "Turtle", "Dinosaur", "Fish"];

fn item(i: usize) -> Record {
    Record::from_pairs([
        ("id", Value::from(i)),
        ("name", Value::from(NAMES[i % NAMES.len()])),
        ("active", Value::from(i % 2 == 1)),
    ])
}

fn active_view(items: &Rc<Collection>) -> FilteredView<Record> {
    FilteredView::new(
        items.clone(),
        ViewSpec::new()
            .filter(|r: &Record| r.get("active").is_true())
            .watch(["active"]),
    )
    .unwrap()
}

fn populated(size: usize) -> (Rc<Collection>, FilteredView<Record>) {
    let items = Collection::new(CollectionOptions::new().comparator("name"));
    let view = active_view(&items);
    items.set((0..size).map(item));
    (items, view)
}

fn bench_bulk_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_set");
    group.sample_size(10);

    for size in [100, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("set_all_at_once", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let items = Collection::new(CollectionOptions::new().comparator("name"));
                    let view = active_view(&items);
                    let data: Vec<Record> = (0..size).map(item).collect();
                    (items, view, data)
                },
                |(items, view, data)| {
                    items.set(data);
                    black_box(view.len())
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_toggle_watched(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_watched");

    for size in [100, 1000, 10000] {
        let (items, view) = populated(size);
        let target = items.at(size / 2).unwrap();
        group.bench_with_input(BenchmarkId::new("leave_and_rejoin", size), &target, |b, target| {
            b.iter(|| {
                let active = target.get("active").is_true();
                target.set("active", !active);
                target.set("active", active);
                black_box(view.len())
            })
        });
    }

    group.finish();
}

fn bench_toggle_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_all");
    group.sample_size(10);

    for size in [100, 1000] {
        let (items, view) = populated(size);
        let models = items.models();
        group.bench_with_input(BenchmarkId::new("deactivate_then_activate", size), &models, |b, models| {
            b.iter(|| {
                for m in models {
                    m.set("active", false);
                }
                for m in models {
                    m.set("active", true);
                }
                black_box(view.len())
            })
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    for size in [100, 1000, 10000] {
        let (_items, view) = populated(size);
        group.bench_with_input(BenchmarkId::new("full", size), &view, |b, view| {
            b.iter(|| {
                view.reconcile();
                black_box(view.len())
            })
        });
    }

    group.finish();
}

fn bench_sorted_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_add");

    for size in [100, 1000, 10000] {
        let (items, view) = populated(size);
        view.configure(ViewSpec::new().comparator("id"), false).unwrap();
        view.reconcile();
        let mut next = size;
        group.bench_function(BenchmarkId::new("add_remove_one", size), |b| {
            b.iter(|| {
                next += 1;
                let added = items.add([item(2 * next + 1)]);
                items.remove(added.iter());
                black_box(view.len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bulk_set,
    bench_toggle_watched,
    bench_toggle_all,
    bench_reconcile,
    bench_sorted_add,
);

criterion_main!(benches);
