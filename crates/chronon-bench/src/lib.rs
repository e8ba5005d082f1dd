//! Benchmark profiles for the Chronon simulation kernel.
//!
//! - [`prepared_state`]: a state with a fixed grid of integer blocks
//! - [`adder_workload`]: never-finishing actions adding to pseudo-random
//!   cells of that grid every tick
//! - [`scatter`]: deterministic cell placement via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use chronon_core::{Access, Action, ApplyError, Handle, Impact, ImpactList, ReadWrite};
use chronon_state::State;

/// Number of integer blocks in the reference profile.
pub const REFERENCE_BLOCKS: usize = 100;
/// Cells per block in the reference profile.
pub const REFERENCE_BLOCK_SIZE: usize = 100;

/// A state holding `blocks` committed integer blocks of `block_size` cells,
/// ids `0..blocks`, all zero.
pub fn prepared_state(blocks: usize, block_size: usize, seed: u64) -> Result<State, ApplyError> {
    let mut state = State::seeded(seed);
    for id in 0..blocks {
        state.apply(&Impact::IntegerAllocateInto {
            handle: Handle::unused(id as i64),
            size: block_size,
        })?;
    }
    Ok(state)
}

/// Deterministic `(block, cell)` targets for `n` writers.
pub fn scatter(blocks: usize, block_size: usize, n: usize, seed: u64) -> Vec<(usize, usize)> {
    let cells = (blocks * block_size).max(1) as u64;
    (0..n as u64)
        .map(|i| {
            let flat = (seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407))
                >> 16)
                % cells;
            let flat = flat as usize;
            (flat / block_size.max(1), flat % block_size.max(1))
        })
        .collect()
}

/// `actions` actions, each adding one to `impacts_per_action` cells on
/// every tick, forever.
pub fn adder_workload(
    blocks: usize,
    block_size: usize,
    actions: usize,
    impacts_per_action: usize,
    seed: u64,
) -> Vec<Action> {
    (0..actions)
        .map(|a| {
            let targets = scatter(blocks, block_size, impacts_per_action, seed ^ a as u64);
            Action::from_fn(move |_| {
                let targets = targets.clone();
                move |_: &dyn Access| -> Option<ImpactList> {
                    Some(
                        targets
                            .iter()
                            .map(|&(block, index)| Impact::IntegerAdd {
                                handle: Handle::new(block as i64, 0),
                                index,
                                delta: 1,
                            })
                            .collect(),
                    )
                }
            })
            .set_tick_duration(1)
        })
        .collect()
}
