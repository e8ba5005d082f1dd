//! Integration test: worker count does not change results.
//!
//! Builds a pseudo-random workload of allocations, sets, adds, continuations
//! and forks from a fixed seed and checks that inline execution and every
//! pool size end in the same state.

use chronon_core::{Access, Action, Handle, Impact, ImpactList};
use chronon_engine::{Execution, ExecutionConfig};
use chronon_state::State;
use chronon_test_utils::fixtures::{add, alloc_into, forking, scripted, set};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;

const BLOCKS: i64 = 8;
const BLOCK_SIZE: usize = 32;

fn pick(rng: &mut ChaCha8Rng, bound: u64) -> u64 {
    rng.next_u64() % bound
}

fn random_step(rng: &mut ChaCha8Rng) -> ImpactList {
    let mut step = ImpactList::new();
    for _ in 0..=pick(rng, 6) {
        let id = pick(rng, BLOCKS as u64) as i64;
        let index = pick(rng, BLOCK_SIZE as u64) as usize;
        let value = pick(rng, 2001) as i64 - 1000;
        step.push(match pick(rng, 10) {
            0 => set(id, index, value),
            1 => Impact::TickContinue,
            _ => add(id, index, value),
        });
    }
    step
}

fn workload(seed: u64) -> Vec<Action> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let setup: ImpactList = (0..BLOCKS).map(|id| alloc_into(id, BLOCK_SIZE)).collect();
    let mut actions = vec![scripted(vec![setup])];
    for _ in 0..24 {
        let steps = (0..=pick(&mut rng, 5))
            .map(|_| random_step(&mut rng))
            .collect();
        let action = scripted(steps).set_tick_duration(1 + pick(&mut rng, 4) as i64);
        if pick(&mut rng, 4) == 0 {
            actions.push(forking(action));
        } else {
            actions.push(action);
        }
    }
    actions
}

fn run(threads: usize, seed: u64) -> Vec<i64> {
    let exe =
        Execution::with_config(State::seeded(seed), ExecutionConfig::threaded(threads)).unwrap();
    for action in workload(seed) {
        exe.queue(action).unwrap();
    }
    exe.schedule_and_join(30).unwrap();
    let state = exe.read().unwrap();
    (0..BLOCKS)
        .flat_map(|id| (0..BLOCK_SIZE).map(move |i| (id, i)))
        .map(|(id, i)| state.get_integer(Handle::new(id, 0), i, i64::MIN))
        .collect()
}

#[test]
fn every_thread_count_matches_inline() {
    for seed in [1, 2, 3] {
        let inline = run(0, seed);
        assert!(inline.iter().all(|&v| v != i64::MIN));
        for threads in [1, 2, 5, 8] {
            assert_eq!(run(threads, seed), inline, "seed={seed} threads={threads}");
        }
    }
}

#[test]
fn split_schedules_match_one_schedule() {
    let whole = run(4, 11);
    let exe = Execution::with_config(State::seeded(11), ExecutionConfig::threaded(4)).unwrap();
    for action in workload(11) {
        exe.queue(action).unwrap();
    }
    for _ in 0..6 {
        exe.schedule(5).unwrap();
    }
    exe.join().unwrap();
    let state = exe.read().unwrap();
    let split: Vec<_> = (0..BLOCKS)
        .flat_map(|id| (0..BLOCK_SIZE).map(move |i| (id, i)))
        .map(|(id, i)| state.get_integer(Handle::new(id, 0), i, i64::MIN))
        .collect();
    assert_eq!(split, whole);
}

#[test]
fn queue_between_schedules_waits_for_workers() {
    let exe = Execution::with_config(State::seeded(0), ExecutionConfig::threaded(3)).unwrap();
    exe.queue(scripted(vec![smallvec![alloc_into(0, 1)]])).unwrap();
    exe.schedule(3).unwrap();
    exe.queue(scripted(vec![smallvec![add(0, 0, 5)]])).unwrap();
    exe.schedule_and_join(1).unwrap();
    assert_eq!(
        exe.read().unwrap().get_integer(Handle::new(0, 0), 0, -1),
        5
    );
}
