//! Benchmarks for record encoding and decoding
//!
//! Run with: cargo bench --bench codec_throughput

use chronolog::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn event_with_frames(frames: usize) -> LogEvent {
    let mut event = LogEvent::new(Level::Warn, "bench.codec", "request {} from {} took {} ms")
        .with_thread_name("bench-worker")
        .with_args(vec![Arg::from(42), Arg::from("10.0.0.1"), Arg::from(12.5)]);
    if frames > 0 {
        let trace = (0..frames)
            .map(|i| StackFrame::new("bench.Handler", format!("call_{}", i)).at("handler.rs", i as u32))
            .collect();
        event = event.with_throwable(
            ThrowableInfo::new("bench::Timeout")
                .with_message("deadline exceeded")
                .with_frames(trace),
        );
    }
    event
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let binary = BinaryCodec::new();
    let text = TextCodec::default();

    for frames in [0usize, 10, 100].iter() {
        let event = event_with_frames(*frames);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("binary", frames), &event, |b, event| {
            b.iter(|| binary.encode(black_box(event)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("text", frames), &event, |b, event| {
            b.iter(|| text.encode(black_box(event)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let binary = BinaryCodec::new();
    let text = TextCodec::default();

    for frames in [0usize, 10, 100].iter() {
        let event = event_with_frames(*frames);
        let binary_record = binary.encode(&event).unwrap();
        let text_record = text.encode(&event).unwrap();

        group.throughput(Throughput::Bytes(binary_record.len() as u64));
        group.bench_with_input(BenchmarkId::new("binary", frames), &binary_record, |b, r| {
            b.iter(|| binary.decode(black_box(r)).unwrap())
        });
        group.throughput(Throughput::Bytes(text_record.len() as u64));
        group.bench_with_input(BenchmarkId::new("text", frames), &text_record, |b, r| {
            b.iter(|| text.decode(black_box(r)).unwrap())
        });
    }
    group.finish();
}

fn bench_depth_cap(c: &mut Criterion) {
    let event = event_with_frames(1_000);
    let capped = BinaryCodec::new().with_stack_trace_depth(8);
    c.bench_function("encode_binary_1000_frames_depth_8", |b| {
        b.iter(|| capped.encode(black_box(&event)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_depth_cap);
criterion_main!(benches);
