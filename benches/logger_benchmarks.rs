//! Criterion benchmarks for rust_async_log_engine

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_async_log_engine::core::formatter::{format_line, sprintf};
use rust_async_log_engine::prelude::*;
use rust_async_log_engine::{info, BoundedQueue, LevelGate};
use std::time::Duration;

fn quiet_engine(level: LogLevel) -> LogEngine {
    let engine = LogEngine::builder()
        .config(
            LoggerConfig::new()
                .with_file(false)
                .with_console(false)
                .with_level(level),
        )
        .build();
    engine.start().expect("engine starts");
    engine
}

// ============================================================================
// Producer Path Benchmarks
// ============================================================================

fn bench_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("submission");
    group.throughput(Throughput::Elements(1));

    let engine = quiet_engine(LogLevel::Info);

    group.bench_function("log_accepted", |b| {
        b.iter(|| {
            engine.log(LogLevel::Info, "INFO", black_box("user=alice action=login"));
        });
    });

    group.bench_function("macro_with_args", |b| {
        b.iter(|| {
            info!(engine, "request {} took {}ms", black_box(42), black_box(7));
        });
    });

    group.bench_function("rejected_by_gate", |b| {
        b.iter(|| {
            engine.debug(black_box("filtered out"));
        });
    });

    group.bench_function("stream", |b| {
        b.iter(|| {
            engine
                .stream(LogLevel::Info)
                .append("items=")
                .append(black_box(12));
        });
    });

    group.finish();
    engine.shutdown(Duration::from_secs(10));
}

// ============================================================================
// Component Benchmarks
// ============================================================================

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");
    group.throughput(Throughput::Elements(1));

    let gate = LevelGate::new(LogLevel::Info);
    group.bench_function("gate_admit", |b| {
        b.iter(|| black_box(gate.admit(black_box(LogLevel::Warn))));
    });

    let record = LogRecord::new(LogLevel::Warn, "disk usage above threshold")
        .with_module("Storage")
        .with_location("src/storage.rs", 88, "storage::check");
    group.bench_function("format_line", |b| {
        b.iter(|| black_box(format_line(black_box(&record))));
    });

    let args = [FormatArg::from("eth0"), FormatArg::from(1500), FormatArg::from(0.25)];
    group.bench_function("sprintf", |b| {
        b.iter(|| black_box(sprintf(black_box("iface=%s mtu=%d loss=%.2f"), &args)));
    });

    let queue = BoundedQueue::new(1024);
    group.bench_function("queue_push_pop", |b| {
        b.iter(|| {
            queue.push(black_box(String::from("line")));
            black_box(queue.try_pop())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_submission, bench_components);
criterion_main!(benches);
