use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pagecache::RecencyCache;

fn bench_access_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_hit");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("access_1kb_hit", |b| {
        let mut cache = RecencyCache::new(1000).unwrap();
        let data = vec![b'x'; 1024];

        for id in 0..100u64 {
            cache.access(id, data.clone());
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.access(counter % 100, data.clone()));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_access_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_evict");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("access_1kb_always_evicts", |b| {
        let mut cache = RecencyCache::new(10).unwrap(); // Small cache
        let data = vec![b'x'; 1024];

        let mut counter = 0u64;
        b.iter(|| {
            // Every key is new, so every access past warm-up evicts
            black_box(cache.access(counter, data.clone()));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_get_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_get_50_access", |b| {
        let mut cache = RecencyCache::new(1000).unwrap();
        let data = vec![b'x'; 1024];

        for id in 0..1000u64 {
            cache.access(id, data.clone());
        }

        let mut counter = 0u64;
        b.iter(|| {
            if counter.is_multiple_of(2) {
                black_box(cache.get(&(counter % 2000)).is_some());
            } else {
                black_box(cache.access(counter % 2000, data.clone()));
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    group.sample_size(50);

    group.bench_function("snapshot_order_1000", |b| {
        let mut cache = RecencyCache::new(1000).unwrap();
        for id in 0..1000u64 {
            cache.access(id, ());
        }

        b.iter(|| black_box(cache.snapshot_order().count()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_access_hit,
    bench_access_evict,
    bench_mixed_get_access,
    bench_snapshot
);
criterion_main!(benches);
