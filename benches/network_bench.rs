//! Benchmark graph construction and backbone extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use cascade_core::{
    corpus::ContributionIndex,
    graph::{CoOccurrenceGraphBuilder, ComponentFilter, DisparityBackboneFilter},
    BackboneConfig, BackboneMethod, GraphConfig,
};

fn synthetic_index(authors: usize, subs: u64, per_author: usize) -> ContributionIndex {
    let mut rng = StdRng::seed_from_u64(7);
    let mut index = ContributionIndex::new();
    for a in 0..authors {
        for _ in 0..per_author {
            let sub = rng.gen_range(0..subs);
            index.insert(&format!("u{a}"), 2020, &format!("r{sub}"), 1);
        }
    }
    index
}

fn bench_build(c: &mut Criterion) {
    let index = synthetic_index(5_000, 400, 6);

    c.bench_function("cooccurrence_build_5k_authors", |b| {
        b.iter(|| {
            let (graph, _) = CoOccurrenceGraphBuilder::new(GraphConfig::default()).build(&index);
            black_box(graph);
        });
    });
}

fn bench_backbone(c: &mut Criterion) {
    let index = synthetic_index(5_000, 400, 6);
    let (graph, _) = CoOccurrenceGraphBuilder::new(GraphConfig::default()).build(&index);
    let giant = ComponentFilter::extract(&graph).graph;

    for method in [BackboneMethod::NoiseCorrected, BackboneMethod::Disparity] {
        let filter = DisparityBackboneFilter::new(BackboneConfig {
            method,
            ..BackboneConfig::default()
        })
        .unwrap();
        c.bench_function(&format!("backbone_{method}"), |b| {
            b.iter(|| black_box(filter.extract(&giant).unwrap()));
        });
    }
}

criterion_group!(benches, bench_build, bench_backbone);
criterion_main!(benches);
