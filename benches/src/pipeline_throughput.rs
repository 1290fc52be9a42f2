use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::StreamExt;
use sdfcheck::prelude::*;
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

const RECORDS: usize = 10_000;

fn records(count: usize) -> Vec<io::Result<String>> {
    (0..count)
        .map(|i| {
            Ok(format!(
                "{i}\n  sdfcheck 2D\n\n  6  6  0  0  0  0            999 V2000\nM  END\n$$$$\n"
            ))
        })
        .collect()
}

/// Benchmark record throughput with a varying number of workers
fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_worker_scaling");
    group.throughput(Throughput::Elements(RECORDS as u64));
    let runtime = Runtime::new().unwrap();

    for workers in [1, 2, 4, 8, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            b.to_async(&runtime).iter_batched(
                || {
                    let pipeline = Pipeline::new(PipelineConfig::new().with_workers(workers));
                    (pipeline, records(RECORDS))
                },
                |(pipeline, records)| async move {
                    let consumer = Arc::new(RecordLength::new(first_token));
                    let mut results = pipeline.run_records("bench", records.into_iter(), consumer);
                    while let Some(result) = results.next().await {
                        black_box(result.unwrap());
                    }
                    results.shutdown().await.unwrap();
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark the cost of storing results
fn bench_store_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_insert");
    group.throughput(Throughput::Elements(RECORDS as u64));

    let results: Vec<ConsumerResult> = (0..RECORDS)
        .map(|i| ConsumerResult::new(i.to_string(), "regression", "64"))
        .collect();

    group.bench_function("memory", |b| {
        b.iter_batched(
            || results.clone(),
            |results| {
                let mut store = MemoryResultStore::new();
                for result in results {
                    store.insert(result).unwrap();
                }
                black_box(store.len())
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("csv", |b| {
        b.iter_batched(
            || (tempfile::tempdir().unwrap(), results.clone()),
            |(dir, results)| {
                let mut store = CsvResultStore::open(dir.path().join("bench.csv")).unwrap();
                for result in results {
                    store.insert(result).unwrap();
                }
                store.flush().unwrap();
                black_box(store.len())
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_worker_scaling, bench_store_insert);
criterion_main!(benches);
