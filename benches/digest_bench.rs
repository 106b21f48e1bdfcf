use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use hashed_kv::HashedMap;
use std::time::Duration;

fn populated(n: usize) -> HashedMap<String, String> {
    let mut map = HashedMap::new();
    for i in 0..n {
        map.insert(format!("user:{i:06}"), "x".to_string()).unwrap();
    }
    map
}

fn bench_updates(c: &mut Criterion) {
    let mut g = c.benchmark_group("hashed_map");
    g.sample_size(60)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2))
        .sampling_mode(SamplingMode::Auto);

    for n in [1_000usize, 100_000] {
        // Dataset is prepared once, outside the measured loop
        let mut map = populated(n);
        map.digest().unwrap();

        g.bench_function(BenchmarkId::new("insert+remove", n), |b| {
            b.iter(|| {
                map.insert(black_box("transient".to_string()), "y".to_string())
                    .unwrap();
                map.remove(black_box("transient")).unwrap();
            });
        });

        g.bench_function(BenchmarkId::new("digest", n), |b| {
            b.iter(|| black_box(map.digest().unwrap()));
        });
    }

    g.finish();
}

criterion_group!(benches, bench_updates);
criterion_main!(benches);
