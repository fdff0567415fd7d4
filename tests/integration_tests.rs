//! Integration tests: deterministic end-to-end flows and two-thread
//! stress runs under realistic contention.

use ringspsc_rs::{Backoff, PopError, RingBuffer};

#[test]
fn test_fill_drain_exact_capacity() {
    let ring = RingBuffer::<u32, 8>::new();

    for i in 0..8 {
        assert!(ring.push(i), "push {} failed below capacity", i);
    }
    assert!(!ring.push(8), "push beyond capacity must fail");

    for i in 0..8 {
        assert_eq!(ring.pop(), Some(i));
    }
    assert_eq!(ring.pop(), None, "pop on drained ring must fail");
}

#[test]
fn test_narrow_index_thousand_cycles() {
    let ring = RingBuffer::<u32, 4, u8>::new();

    for round in 0..1000u32 {
        assert!(ring.push(round));
        assert_eq!(ring.pop(), Some(round));
    }
    assert!(ring.is_empty());
}

#[test]
fn test_batch_round_trip() {
    let ring = RingBuffer::<u64, 16>::new();
    let src = [10, 20, 30, 40, 50, 60, 70, 80];

    assert_eq!(ring.push_slice(&src), 8);

    let mut dst = [0u64; 8];
    assert_eq!(ring.pop_slice(&mut dst), 8);
    assert_eq!(dst, src);
}

#[test]
fn test_oversize_batch_truncates_to_capacity() {
    let ring = RingBuffer::<u32, 16>::new();
    let src: Vec<u32> = (0..20).collect();

    assert_eq!(ring.push_slice(&src), 16);
    assert!(ring.is_full());
}

#[test]
fn test_push_with_not_invoked_when_full() {
    let ring = RingBuffer::<u32, 4>::new();
    let mut invocations = 0u32;

    while ring.push_with(|| {
        invocations += 1;
        invocations
    }) {}

    assert_eq!(invocations, 4, "payload callback ran on a full ring");
    assert!(ring.is_full());
}

#[test]
fn test_two_threads_million_values_in_order() {
    const COUNT: u64 = 1_000_000;

    let mut ring = Box::new(RingBuffer::<u64, 1024>::new());
    let (mut producer, mut consumer) = ring.split();

    crossbeam_utils::thread::scope(|scope| {
        scope.spawn(move |_| {
            for i in 0..COUNT {
                // A fresh policy per exhaustion keeps retrying if the
                // consumer is descheduled for a long stretch.
                while !Backoff::run(|| producer.push(i).is_ok()) {}
            }
        });

        scope.spawn(move |_| {
            let mut expected = 0u64;
            while expected < COUNT {
                match consumer.pop() {
                    Ok(v) => {
                        assert_eq!(v, expected, "FIFO order violated");
                        expected += 1;
                    }
                    Err(PopError::Empty) => std::hint::spin_loop(),
                }
            }
            assert!(consumer.is_empty());
        });
    })
    .unwrap();
}

#[test]
fn test_two_threads_batch_transfer() {
    const COUNT: u64 = 200_000;
    const BATCH: usize = 64;

    let mut ring = Box::new(RingBuffer::<u64, 256>::new());
    let (mut producer, mut consumer) = ring.split();

    crossbeam_utils::thread::scope(|scope| {
        scope.spawn(move |_| {
            let mut sent = 0u64;
            let mut chunk = [0u64; BATCH];
            while sent < COUNT {
                let want = BATCH.min((COUNT - sent) as usize);
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

        scope.spawn(move |_| {
            let mut expected = 0u64;
            let mut dst = [0u64; BATCH];
            while expected < COUNT {
                let got = consumer.pop_slice(&mut dst);
                for &v in &dst[..got] {
                    assert_eq!(v, expected, "FIFO order violated in batch");
                    expected += 1;
                }
                if got == 0 {
                    std::hint::spin_loop();
                }
            }
            assert!(consumer.is_empty());
        });
    })
    .unwrap();
}

#[test]
fn test_notifications_account_for_every_element() {
    const COUNT: usize = 50_000;

    let mut ring = Box::new(RingBuffer::<u32, 128>::new());
    let (mut producer, mut consumer) = ring.split();

    crossbeam_utils::thread::scope(|scope| {
        let handle = scope.spawn(move |_| {
            let src: Vec<u32> = (0..COUNT as u32).collect();
            let mut published = 0usize;
            let mut offset = 0;
            while offset < COUNT {
                let wrote = producer.push_slice_with(&src[offset..], |k| published += k);
                offset += wrote;
                if wrote == 0 {
                    std::hint::spin_loop();
                }
            }
            published
        });

        let mut drained = 0usize;
        let mut released = 0usize;
        let mut dst = [0u32; 64];
        while drained < COUNT {
            let got = consumer.pop_slice_with(&mut dst, |k| released += k);
            drained += got;
            if got == 0 {
                std::hint::spin_loop();
            }
        }

        assert_eq!(released, COUNT, "release notifications missed elements");
        assert_eq!(handle.join().unwrap(), COUNT, "publish notifications missed elements");
    })
    .unwrap();
}
