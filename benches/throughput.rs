use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ringspsc_rs::RingBuffer;

const MSG_COUNT: u64 = 1_000_000;
const BATCH_SIZE: usize = 512;

fn bench_single_element(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_COUNT));

    group.bench_function("push_pop_two_threads", |b| {
        b.iter(|| {
            let mut ring = Box::new(RingBuffer::<u64, 4096>::new());
            let (mut producer, mut consumer) = ring.split();

            crossbeam_utils::thread::scope(|scope| {
                scope.spawn(move |_| {
                    let mut sent = 0u64;
                    while sent < MSG_COUNT {
                        if producer.push(sent).is_ok() {
                            sent += 1;
                        } else {
                            std::hint::spin_loop();
                        }
                    }
                });

                let mut received = 0u64;
                while received < MSG_COUNT {
                    if let Ok(v) = consumer.pop() {
                        black_box(v);
                        received += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            })
            .unwrap();
        });
    });

    group.finish();
}

fn bench_batched(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_batched");
    group.throughput(Throughput::Elements(MSG_COUNT));

    group.bench_function("slice_transfer_two_threads", |b| {
        b.iter(|| {
            let mut ring = Box::new(RingBuffer::<u64, 4096>::new());
            let (mut producer, mut consumer) = ring.split();

            crossbeam_utils::thread::scope(|scope| {
                scope.spawn(move |_| {
                    let mut chunk = [0u64; BATCH_SIZE];
                    let mut sent = 0u64;
                    while sent < MSG_COUNT {
                        let want = BATCH_SIZE.min((MSG_COUNT - sent) as usize);
                        for (i, slot) in chunk[..want].iter_mut().enumerate() {
                            *slot = sent + i as u64;
                        }
                        let mut offset = 0;
                        while offset < want {
                            let wrote = producer.push_slice(&chunk[offset..want]);
                            offset += wrote;
                            if wrote == 0 {
                                std::hint::spin_loop();
                            }
                        }
                        sent += want as u64;
                    }
                });

                let mut dst = [0u64; BATCH_SIZE];
                let mut received = 0u64;
                while received < MSG_COUNT {
                    let got = consumer.pop_slice(&mut dst);
                    received += got as u64;
                    black_box(&dst[..got]);
                    if got == 0 {
                        std::hint::spin_loop();
                    }
                }
            })
            .unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_element, bench_batched);
criterion_main!(benches);
