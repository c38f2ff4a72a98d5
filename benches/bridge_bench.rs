use bytes::BytesMut;
use chat_stream_bridge::models::azure::ChatCompletionChunk;
use chat_stream_bridge::models::ui::*;
use chat_stream_bridge::streaming::*;
use chat_stream_bridge::transform::*;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn conversation() -> Vec<ConversationMessage> {
    let json = r#"[
        {"id":"1","role":"system","parts":[{"type":"text","text":"You are a Rust expert."}]},
        {"id":"2","role":"user","parts":[{"type":"step-start"},{"type":"text","text":"What is Rust?"}]},
        {"id":"3","role":"assistant","parts":[{"type":"text","text":"Rust is a systems programming language."},{"type":"reasoning","text":"..."}]},
        {"id":"4","role":"user","parts":[{"type":"text","text":"Tell me more."},{"type":"text","text":"Especially ownership."}]}
    ]"#;
    serde_json::from_str(json).unwrap()
}

/// Upstream body with `n` content deltas and the terminator
fn upstream_stream(n: usize) -> Vec<u8> {
    let mut body = Vec::new();
    for i in 0..n {
        body.extend_from_slice(
            format!(
                "data: {{\"id\":\"chatcmpl-1\",\"object\":\"chat.completion.chunk\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"token {} \"}},\"finish_reason\":null}}]}}\n\n",
                i
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(b"data: [DONE]\n\n");
    body
}

fn benchmark_flatten_messages(c: &mut Criterion) {
    let messages = conversation();

    c.bench_function("flatten_messages", |b| {
        b.iter(|| {
            black_box(flatten_messages(&messages));
        });
    });
}

fn benchmark_request_serialization(c: &mut Criterion) {
    let request = build_provider_request(&conversation(), None, true);

    c.bench_function("serialize_provider_request", |b| {
        b.iter(|| {
            black_box(serde_json::to_vec(&request).unwrap());
        });
    });
}

fn benchmark_frame_decoder(c: &mut Criterion) {
    let data = upstream_stream(100);

    let mut group = c.benchmark_group("frame_decoder");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("decode_complete_stream", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::<ChatCompletionChunk>::new();
            black_box(decoder.feed(&data));
        });
    });

    group.bench_function("decode_small_chunks", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::<ChatCompletionChunk>::new();
            for chunk in data.chunks(17) {
                black_box(decoder.feed(chunk));
            }
        });
    });

    group.finish();
}

fn benchmark_end_to_end(c: &mut Criterion) {
    let data = upstream_stream(100);

    let mut group = c.benchmark_group("end_to_end");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("decode_transcode_encode", |b| {
        b.iter(|| {
            let mut decoder = FrameDecoder::<ChatCompletionChunk>::new();
            let mut transcoder = EventTranscoder::new("msg-0");
            let mut out = BytesMut::with_capacity(data.len() * 2);

            let mut events = transcoder.open();
            for frame in decoder.feed(&data) {
                if let Ok(chunk) = frame.payload {
                    events.extend(transcoder.transcode(&chunk));
                }
            }
            events.extend(transcoder.close());

            encode_events(&events, &mut out).unwrap();
            out.extend_from_slice(DONE_FRAME);
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_flatten_messages,
    benchmark_request_serialization,
    benchmark_frame_decoder,
    benchmark_end_to_end
);
criterion_main!(benches);
