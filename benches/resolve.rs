use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use namelink::{
    BatchConfig, BatchResolver, Entity, Prefilter, ReferenceIndex, ResolutionCache, Resolver,
    ResolverConfig,
};

const REFERENCE_ROWS: usize = 20_000;

fn reference_rows() -> Vec<Entity> {
    // Surnames repeat every 997 rows and given names every 89, so the token
    // postings look like a real credits list rather than unique strings.
    (0..REFERENCE_ROWS)
        .map(|i| {
            let name = format!("Surname{}, Given{} Middle{}", i % 997, i % 89, i % 13);
            Entity::new(format!("nm{i:07}"), name)
        })
        .collect()
}

fn mixed_queries(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| match i % 4 {
            0 => format!("Given{} Middle{} Surname{}", i % 89, i % 13, i % 997),
            1 => format!("surname{} given{} middle{}", i % 997, i % 89, i % 13),
            2 => format!("Given{} Surname{}", i % 89, i % 997),
            _ => format!("Unknown Person {i}"),
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let rows = reference_rows();
    let mut group = c.benchmark_group("index");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.sample_size(10);
    group.bench_function("build_20k", |b| {
        b.iter_batched(|| rows.clone(), ReferenceIndex::build, BatchSize::LargeInput);
    });
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let index = ReferenceIndex::build(reference_rows());
    let queries = mixed_queries(1_000);

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("cold_cache", |b| {
        b.iter(|| {
            let mut resolver = Resolver::with_defaults(&index);
            resolver.resolve_all(&queries)
        });
    });

    group.bench_function("warm_cache", |b| {
        let mut resolver = Resolver::with_defaults(&index);
        resolver.resolve_all(&queries);
        b.iter(|| resolver.resolve_all(&queries));
    });

    let prefilters = [
        ("similarity_shared_token", Prefilter::SharedToken),
        ("similarity_initial", Prefilter::Initial),
    ];
    for (label, prefilter) in prefilters {
        let config = ResolverConfig::default()
            .with_similarity_threshold(0.6)
            .with_prefilter(prefilter);
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut cache = ResolutionCache::new();
                queries
                    .iter()
                    .filter(|q| namelink::resolve(q, &index, &mut cache, &config).is_matched())
                    .count()
            });
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let index = Arc::new(ReferenceIndex::build(reference_rows()));
    let queries = mixed_queries(10_000);

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(queries.len() as u64));
    group.sample_size(20);

    for workers in [1, 4] {
        let batch = BatchResolver::new(
            Arc::clone(&index),
            ResolverConfig::default(),
            BatchConfig::default().with_workers(workers),
        )
        .unwrap();
        group.bench_function(format!("workers_{workers}"), |b| {
            b.iter(|| batch.resolve_batch(&queries).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_resolve, bench_batch);
criterion_main!(benches);
