// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `trellis_tree` update, read, and write paths.

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use trellis_schema::{ErasedValue, SchemaRegistry};
use trellis_tree::{PropertyTree, SharedTarget, share_target};

#[derive(Clone, PartialEq)]
struct Transform {
    x: f64,
    y: f64,
    rotation: f64,
}

#[derive(Clone, PartialEq)]
struct Actor {
    name: String,
    health: i32,
    transform: Transform,
    tags: Vec<i32>,
}

fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.register::<Transform>("Transform", |t| {
        t.primitive("x", |v: &Transform| v.x, |v, x| v.x = x);
        t.primitive("y", |v: &Transform| v.y, |v, x| v.y = x);
        t.primitive("rotation", |v: &Transform| v.rotation, |v, x| v.rotation = x);
    });
    registry.register::<Actor>("Actor", |t| {
        t.primitive("name", |v: &Actor| v.name.clone(), |v, x| v.name = x);
        t.primitive("health", |v: &Actor| v.health, |v, x| v.health = x);
        t.aggregate(
            "transform",
            |v: &Actor| v.transform.clone(),
            |v, x| v.transform = x,
        );
        t.array("tags", |v: &Actor| v.tags.clone(), |v, x| v.tags = x);
    });
    Arc::new(registry)
}

fn actor(tag_count: usize) -> Actor {
    Actor {
        name: String::from("actor"),
        health: 100,
        transform: Transform {
            x: 1.0,
            y: 2.0,
            rotation: 0.5,
        },
        tags: (0..tag_count as i32).collect(),
    }
}

fn tree_over(targets: Vec<Actor>) -> (PropertyTree, Vec<SharedTarget>) {
    let cells: Vec<SharedTarget> = targets
        .into_iter()
        .map(|target| share_target(ErasedValue::new(target)))
        .collect();
    let mut tree = PropertyTree::new(registry(), cells.clone()).unwrap();
    tree.update(false);
    (tree, cells)
}

fn bench_property_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_tree/update");

    group.bench_function("frame_tick", |b| {
        let (mut tree, _) = tree_over(vec![actor(16)]);
        b.iter(|| {
            tree.update(false);
            black_box(tree.current_frame())
        })
    });

    group.bench_function("forced_refresh", |b| {
        let (mut tree, _) = tree_over(vec![actor(16)]);
        b.iter(|| {
            tree.update(true);
            black_box(tree.current_frame())
        })
    });

    group.finish();

    let mut group = c.benchmark_group("property_tree/read");

    group.bench_function("cached_value", |b| {
        let (mut tree, _) = tree_over(vec![actor(4)]);
        let health = tree.children(tree.root())[1];
        tree.value(health);
        b.iter(|| black_box(tree.value(health).is_some()))
    });

    group.bench_function("mixed_detection_two_targets", |b| {
        let (mut tree, _) = tree_over(vec![actor(4), actor(8)]);
        let tags = tree.children(tree.root())[3];
        b.iter(|| {
            tree.update(false);
            black_box(tree.is_value_mixed(tags))
        })
    });

    group.finish();

    let mut group = c.benchmark_group("property_tree/write");

    group.bench_function("leaf_primitive", |b| {
        let (mut tree, _) = tree_over(vec![actor(4)]);
        let health = tree.children(tree.root())[1];
        b.iter(|| tree.set_primitive(health, black_box(55)).unwrap())
    });

    group.bench_function("nested_aggregate_leaf", |b| {
        let (mut tree, _) = tree_over(vec![actor(4)]);
        let transform = tree.children(tree.root())[2];
        let x = tree.children(transform)[0];
        b.iter(|| tree.set_primitive(x, black_box(3.5)).unwrap())
    });

    group.finish();

    let mut group = c.benchmark_group("property_tree/resize");

    group.bench_function("grow_and_shrink", |b| {
        b.iter_batched(
            || tree_over(vec![actor(8)]),
            |(mut tree, cells)| {
                let tags = tree.children(tree.root())[3];
                *cells[0].borrow_mut() = ErasedValue::new(actor(64));
                tree.update(false);
                black_box(tree.array_elements(tags).len());
                *cells[0].borrow_mut() = ErasedValue::new(actor(2));
                tree.update(false);
                black_box(tree.array_elements(tags).len());
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_property_tree);
criterion_main!(benches);
