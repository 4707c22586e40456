//! Codec benchmarks for relay-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relay_protocol::{codec, ChatMessage, InboundEvent, OutboundEvent, UserPresence, WireFormat};

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_inbound");

    let event = InboundEvent::SendMessage(ChatMessage::text("user-1", "user-2", "x".repeat(256)));
    let codec::EncodedFrame::Text(text) = codec::encode(&event, WireFormat::Json).unwrap() else {
        unreachable!()
    };
    let codec::EncodedFrame::Binary(binary) =
        codec::encode(&event, WireFormat::MessagePack).unwrap()
    else {
        unreachable!()
    };

    group.bench_function("json", |b| {
        b.iter(|| codec::decode_text::<InboundEvent>(black_box(&text)).unwrap())
    });
    group.bench_function("msgpack", |b| {
        b.iter(|| codec::decode_binary::<InboundEvent>(black_box(&binary)).unwrap())
    });

    group.finish();
}

fn bench_encode_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_snapshot");

    for users in [10usize, 1_000] {
        let snapshot = OutboundEvent::GetUsers(
            (0..users)
                .map(|i| UserPresence::new(format!("user-{i}"), format!("conn-{i}")))
                .collect(),
        );

        group.bench_function(format!("{users}_users_json"), |b| {
            b.iter(|| codec::encode(black_box(&snapshot), WireFormat::Json).unwrap())
        });
        group.bench_function(format!("{users}_users_msgpack"), |b| {
            b.iter(|| codec::encode(black_box(&snapshot), WireFormat::MessagePack).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode_snapshot);
criterion_main!(benches);
