use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gcmap::libs::contact::{compute, levenshtein, BatchSink, ContactOpts, Levenshtein};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_seq(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

// One pair per resolution bucket
fn bench_window(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut group = c.benchmark_group("window");

    for len in [10, 100, 1000] {
        let a = random_seq(&mut rng, len);
        let b = random_seq(&mut rng, len);

        group.bench_with_input(BenchmarkId::new("fresh", len), &len, |bench, _| {
            bench.iter(|| levenshtein(black_box(&a), black_box(&b)))
        });

        let mut engine = Levenshtein::new();
        group.bench_with_input(BenchmarkId::new("reused", len), &len, |bench, _| {
            bench.iter(|| engine.distance(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn bench_map(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let seq = random_seq(&mut rng, 2_000);
    let mut group = c.benchmark_group("map");
    group.sample_size(10);

    for parallel in [1, 4] {
        let opts = ContactOpts {
            chunk_size: 500,
            parallel,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("2kb", parallel), &parallel, |bench, _| {
            bench.iter(|| {
                let sink = Box::new(BatchSink::new(std::io::sink(), "bench", false));
                compute(black_box(&seq), &opts, sink, |_| {}).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_window, bench_map);
criterion_main!(benches);
