use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kit_cache::{backend::InMemoryBackend, Codec, ModelCache};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::time::Duration;

#[derive(Clone, Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    tags: Vec<String>,
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            id: i as u64,
            name: format!("record-{}", i),
            tags: vec!["alpha".to_string(), "beta".to_string()],
        })
        .collect()
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Codec/encode");
    let codec = Codec::new();

    // 4 stays under the gzip threshold, the others go through the compressor
    for n in [4usize, 64, 1024] {
        let value = records(n);
        let size = serde_json::to_vec(&value).map(|v| v.len()).unwrap_or(0);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &value, |b, value| {
            b.iter(|| black_box(codec.encode(value, 2048)));
        });
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Codec/decode");
    let codec = Codec::new();

    for n in [4usize, 64, 1024] {
        let encoded = codec.encode(&records(n), 2048).expect("encode");
        group.bench_with_input(BenchmarkId::from_parameter(n), &encoded, |b, encoded| {
            b.iter(|| {
                black_box(codec.decode::<Vec<Record>>(&encoded.bytes, encoded.compressed))
            });
        });
    }

    group.finish();
}

fn benchmark_model_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("ModelCache");
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let cache = ModelCache::new(InMemoryBackend::new());
    let value = records(256);

    group.bench_function("set_model_256", |b| {
        b.to_async(&rt).iter(|| async {
            cache
                .set_model("bench:set", &value, Duration::from_secs(60))
                .await
                .expect("set")
        });
    });

    rt.block_on(cache.set_model("bench:get", &value, Duration::from_secs(60)))
        .expect("set");
    group.bench_function("get_model_256", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                cache
                    .get_model::<Vec<Record>>("bench:get")
                    .await
                    .expect("get"),
            )
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode,
    benchmark_decode,
    benchmark_model_cache
);
criterion_main!(benches);
