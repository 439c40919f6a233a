//! Criterion benchmarks for batchlog

use batchlog::core::{render_template, BoundedQueue};
use batchlog::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

/// Sink that discards everything, so benchmarks measure the pipeline only
struct NullSink;

impl Sink for NullSink {
    fn write_batch(&mut self, batch: &[LogEntry]) -> Result<()> {
        black_box(batch);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn bench_logger(capacity: usize) -> Logger {
    Logger::builder(
        LoggerConfig::default()
            .with_min_level(LogLevel::Info)
            .with_queue_capacity(capacity)
            .with_colors(false),
    )
    .console_writer(std::io::sink())
    .sink(NullSink)
    .diagnostics(Diagnostics::with_handler(Arc::new(|_| {})))
    .build()
    .expect("valid configuration")
}

// ============================================================================
// Enqueue Benchmarks
// ============================================================================

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue");
    group.throughput(Throughput::Elements(1));

    let logger = bench_logger(100_000);

    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box("Info message"));
        });
    });

    group.bench_function("filtered_debug", |b| {
        b.iter(|| {
            logger.debug(black_box("Debug message"));
        });
    });

    group.bench_function("structured", |b| {
        b.iter(|| {
            logger.log_structured(
                LogLevel::Info,
                black_box("user {id} did {action}"),
                props! { "id" => 42, "action" => "login" },
            );
        });
    });

    group.finish();
}

fn bench_concurrent_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_enqueue");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1000) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let logger = Arc::new(bench_logger(100_000));
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let logger = Arc::clone(&logger);
                        thread::spawn(move || {
                            for i in 0..1000 {
                                logger.info(format!("message {}", i));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_raw_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_queue");
    group.throughput(Throughput::Elements(1));

    let queue = BoundedQueue::new(1024);
    group.bench_function("enqueue_dequeue", |b| {
        b.iter(|| {
            queue.try_enqueue(black_box(7u64));
            black_box(queue.try_dequeue())
        });
    });

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new(LogLevel::Info, "user {id} logged in from {ip}").with_properties(
        props! { "id" => 42, "ip" => "10.0.0.7", "region" => "eu-west" },
    );

    for format in [OutputFormat::Text, OutputFormat::KeyValue, OutputFormat::Json] {
        let formatter = Formatter::new(format).with_structured_data(true);
        group.bench_function(format!("{:?}", format), |b| {
            b.iter(|| black_box(formatter.format(black_box(&entry))));
        });
    }

    let props = props! { "id" => 42, "ip" => "10.0.0.7" };
    group.bench_function("render_template", |b| {
        b.iter(|| black_box(render_template(black_box("user {id} logged in from {ip}"), &props)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_enqueue,
    bench_concurrent_enqueue,
    bench_raw_queue,
    bench_formatting
);

criterion_main!(benches);
