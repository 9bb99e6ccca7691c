//! Benchmarks for event relay publish/drain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nh_bridge::{EventRelay, PendingEvent, RelayMode};

fn bench_publish_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay_publish_drain");

    for count in [16usize, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("live", count), count, |b, &count| {
            let relay = EventRelay::new(count);
            relay.set_mode(RelayMode::Live);

            b.iter(|| {
                for i in 0..count {
                    relay.publish(PendingEvent::WindowResized {
                        width: i as u32,
                        height: i as u32,
                    });
                }
                black_box(relay.drain().count())
            });
        });

        group.bench_with_input(BenchmarkId::new("buffering", count), count, |b, &count| {
            let relay = EventRelay::new(count);

            b.iter(|| {
                for i in 0..count {
                    relay.publish(PendingEvent::WindowResized {
                        width: i as u32,
                        height: i as u32,
                    });
                    relay.publish(PendingEvent::ReturnKeyPressed);
                }
                black_box(relay.drain().count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_publish_drain);
criterion_main!(benches);
