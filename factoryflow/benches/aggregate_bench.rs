//! Benchmarks for report aggregation and all-mock runs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use factoryflow::config::WorkflowConfig;
use factoryflow::events::NoOpEventSink;
use factoryflow::pipeline::WorkflowEngine;
use factoryflow::testing::sample_report;
use std::sync::Arc;
use std::time::Duration;

fn aggregate_benchmark(c: &mut Criterion) {
    c.bench_function("aggregate_six_stages", |b| {
        b.iter(|| black_box(sample_report(black_box("workflow_bench"))));
    });
}

fn engine_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let engine = WorkflowEngine::builder()
        .event_sink(Arc::new(NoOpEventSink))
        .build();
    let config = WorkflowConfig::new("ai productivity")
        .with_retry_delay(Duration::ZERO)
        .with_storage(false)
        .with_report_publishing(false);

    c.bench_function("all_mock_run", |b| {
        b.iter(|| runtime.block_on(engine.execute(black_box(config.clone()))));
    });
}

criterion_group!(benches, aggregate_benchmark, engine_benchmark);
criterion_main!(benches);
