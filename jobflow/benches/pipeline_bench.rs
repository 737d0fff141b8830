//! Benchmarks for backoff, successor expansion and a small in-memory run.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobflow::cancellation::CancellationToken;
use jobflow::config::{from_json_str, RunConfig};
use jobflow::core::{NodeTemplate, PipelineNode, TaskSpec};
use jobflow::generators::default_generators;
use jobflow::handlers::HandlerRegistry;
use jobflow::pipeline::{BackoffPolicy, FanOutScheduler, SuccessorExpander};
use jobflow::telemetry::NoOpTelemetry;
use std::sync::Arc;

fn backoff_benchmark(c: &mut Criterion) {
    let backoff = BackoffPolicy::new(500).with_max_delay_ms(30_000);
    c.bench_function("backoff_delay", |b| {
        b.iter(|| {
            for attempt in 0..16 {
                black_box(backoff.delay(black_box(attempt)));
            }
        });
    });
}

fn expansion_benchmark(c: &mut Criterion) {
    let expander = SuccessorExpander::new(default_generators());
    let parent = PipelineNode::root(
        NodeTemplate::new(TaskSpec::new("ai", "prompt")).generated_by("ai_followups"),
    );
    c.bench_function("expand_generated", |b| {
        b.iter(|| black_box(expander.expand(&parent, black_box("generated content"))));
    });
}

fn config_benchmark(c: &mut Criterion) {
    let json = r#"{
        "max_concurrency": 4,
        "pipeline": [
            {"id": 1, "type": "download", "payload": "https://example.com",
             "next": [{"id": 2, "type": "ai", "payload": "summarize", "generator": "ai_followups"}]}
        ]
    }"#;
    c.bench_function("parse_config", |b| {
        b.iter(|| black_box(from_json_str(black_box(json))));
    });
}

fn run_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let handlers = HandlerRegistry::builder()
        .register_fn("echo", |payload| async move { Ok(payload) })
        .build();
    let scheduler = FanOutScheduler::new(handlers, default_generators(), Arc::new(NoOpTelemetry));
    let config = RunConfig::default()
        .with_max_concurrency(8)
        .with_tasks((0..64).map(|i| TaskSpec::new("echo", i.to_string())).collect());

    c.bench_function("run_64_echo_nodes", |b| {
        b.iter(|| {
            runtime.block_on(scheduler.run(&config, Arc::new(CancellationToken::new())))
        });
    });
}

criterion_group!(
    benches,
    backoff_benchmark,
    expansion_benchmark,
    config_benchmark,
    run_benchmark
);
criterion_main!(benches);
