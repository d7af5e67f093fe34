//! Dispatch and line codec throughput benchmark.
//!
//! Measures tool-call dispatch (validation, execution, normalization) and
//! read_frame/write_frame latency using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;
use toolhost::tools::{Arguments, ExampleTools, ToolRegistry};
use toolhost::transport::{read_frame, write_frame};
use toolhost::RequestDispatcher;

const MAX_LINE: usize = 5 * 1024 * 1024;

fn dispatcher() -> RequestDispatcher<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_provider(Arc::new(ExampleTools)).unwrap();
    RequestDispatcher::new(registry)
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let d = dispatcher();

    let mut group = c.benchmark_group("handle_call");
    for &size in &[0usize, 64, 1024, 16384] {
        let mut args = Arguments::new();
        args.insert("message".into(), json!("x".repeat(size)));
        group.bench_with_input(BenchmarkId::new("echo", size), &args, |b, a| {
            b.iter(|| rt.block_on(d.handle_call("echo", black_box(a.clone()))));
        });
    }
    group.bench_function("unknown_tool", |b| {
        b.iter(|| rt.block_on(d.handle_call(black_box("missing"), Arguments::new())));
    });
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("line_codec");
    for &size in &[0usize, 1024, 65536] {
        let message = json!({"jsonrpc": "2.0", "id": 1, "result": {"pad": "x".repeat(size)}});
        let wire = rt.block_on(async {
            let mut buf = Vec::new();
            write_frame(&mut buf, &message).await.unwrap();
            buf
        });

        group.bench_with_input(BenchmarkId::new("write", size), &message, |b, m| {
            b.iter(|| {
                rt.block_on(async {
                    let mut buf = Vec::with_capacity(size + 64);
                    write_frame(&mut buf, black_box(m)).await.unwrap();
                    buf
                })
            });
        });
        group.bench_with_input(BenchmarkId::new("read", size), &wire, |b, w| {
            b.iter(|| {
                rt.block_on(async {
                    let mut reader = black_box(w.as_slice());
                    read_frame(&mut reader, MAX_LINE).await.unwrap()
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_codec);
criterion_main!(benches);
