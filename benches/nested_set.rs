use criterion::{black_box, criterion_group, criterion_main, Criterion};

use xspawn::{NestedSet, NestedSetBuilder, Order};

/// A DAG shaped like a dependency chain: each layer adds a few direct
/// elements on top of the previous layer and a shared sibling set.
fn build_layered(layers: usize, width: usize) -> NestedSet<String> {
    let shared = NestedSet::wrap(Order::Stable, (0..width).map(|i| format!("shared{}", i)));
    let mut set = shared.clone();
    for layer in 0..layers {
        let mut builder = NestedSetBuilder::new(Order::Stable);
        for i in 0..width {
            builder.add(format!("l{}e{}", layer, i));
        }
        builder.add_transitive(set);
        builder.add_transitive(shared.clone());
        set = builder.build();
    }
    set
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_layered_100x8", |b| {
        b.iter(|| black_box(build_layered(100, 8)))
    });
}

fn bench_first_flatten(c: &mut Criterion) {
    c.bench_function("first_flatten_100x8", |b| {
        b.iter_with_setup(
            || build_layered(100, 8),
            |set| black_box(set.to_list()),
        )
    });
}

fn bench_replay_flatten(c: &mut Criterion) {
    let set = build_layered(100, 8);
    set.to_list();
    c.bench_function("replay_flatten_100x8", |b| b.iter(|| black_box(set.to_list())));
}

fn bench_split(c: &mut Criterion) {
    let set = NestedSet::wrap(Order::Stable, (0..1000).map(|i| format!("e{}", i)));
    c.bench_function("split_1000_by_16", |b| {
        b.iter(|| black_box(set.split_if_exceeds_max_degree(16)))
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_first_flatten,
    bench_replay_flatten,
    bench_split
);
criterion_main!(benches);
