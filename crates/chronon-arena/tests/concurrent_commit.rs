//! Integration test: concurrent delta writes and chunked commit.
//!
//! Many threads write deltas to the same cells through a shared buffer,
//! then many threads commit chunks in parallel. The committed result must
//! equal the sequential sum regardless of interleaving.

use std::thread;

use chronon_arena::{Buffer, BufferConfig};
use chronon_core::Handle;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

const THREADS: usize = 16;

fn commit_in_parallel(buf: &Buffer<i64>) {
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| while buf.adjust_chunk() {});
        }
    });
    buf.adjust_done();
}

#[test]
fn racing_adds_sum_exactly() {
    let mut buf = Buffer::<i64>::new();
    let h = buf.allocate(1).unwrap();

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..1000 {
                    buf.add(h, 0, 1).unwrap();
                    buf.add(h, 0, -1).unwrap();
                }
                buf.add(h, 0, 1).unwrap();
            });
        }
    });
    buf.adjust();

    assert_eq!(buf.get(h, 0, 0), THREADS as i64);
}

#[test]
fn thousand_threads_net_one_each() {
    let mut buf = Buffer::<i64>::new();
    let h = buf.allocate(1).unwrap();

    thread::scope(|s| {
        for _ in 0..1000 {
            s.spawn(|| {
                buf.add(h, 0, 1).unwrap();
                buf.add(h, 0, -1).unwrap();
                buf.add(h, 0, 1).unwrap();
            });
        }
    });
    commit_in_parallel(&buf);

    assert_eq!(buf.get(h, 0, 0), 1000);
}

#[test]
fn parallel_chunks_commit_every_cell_once() {
    let mut buf = Buffer::<i64>::with_config(&BufferConfig::with_chunk_size(7)).unwrap();
    let handles: Vec<Handle> = (1..40).map(|n| buf.allocate(n).unwrap()).collect();

    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut expected = Vec::new();
    for &h in &handles {
        let deltas: Vec<i64> = (0..buf.block_size(h))
            .map(|_| (rng.next_u64() % 1000) as i64 - 500)
            .collect();
        buf.write_deltas(h, 0, &deltas).unwrap();
        expected.push(deltas);
    }

    commit_in_parallel(&buf);

    for (h, want) in handles.iter().zip(&expected) {
        let mut got = vec![0; want.len()];
        buf.read(*h, 0, &mut got).unwrap();
        assert_eq!(&got, want);
    }

    // A second round starts from a rewound cursor.
    buf.add(handles[0], 0, 1).unwrap();
    commit_in_parallel(&buf);
    assert_eq!(buf.get(handles[0], 0, 0), expected[0][0] + 1);
}

#[test]
fn interleaved_sets_and_adds_commute() {
    let mut buf = Buffer::<i64>::new();
    let h = buf.allocate(THREADS).unwrap();
    buf.write_values(h, 0, &[5; THREADS]).unwrap();
    buf.adjust();

    thread::scope(|s| {
        for i in 0..THREADS {
            let buf = &buf;
            s.spawn(move || {
                buf.add(h, i, 3).unwrap();
                buf.set(h, i, 40).unwrap();
            });
        }
    });
    buf.adjust();

    let mut out = vec![0; THREADS];
    buf.read(h, 0, &mut out).unwrap();
    assert!(out.iter().all(|&v| v == 43));
}
