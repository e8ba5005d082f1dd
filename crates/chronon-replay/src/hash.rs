//! Hashing of committed simulation state.
//!
//! Uses FNV-1a for fast, deterministic hashing. The hash is not
//! cryptographically secure; it only serves equality checks between runs.

use chronon_arena::{Buffer, Scalar};
use chronon_state::State;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fold_buffer<T>(mut hash: u64, buffer: &Buffer<T>) -> u64
where
    T: Scalar + Into<i64>,
{
    for (handle, size) in buffer.live_blocks() {
        hash = fnv1a_u64(hash, handle.id as u64);
        hash = fnv1a_u64(hash, handle.generation as u64);
        hash = fnv1a_u64(hash, size as u64);
        for index in 0..size {
            let value: i64 = buffer.get(handle, index, T::ZERO).into();
            hash = fnv1a_u64(hash, value as u64);
        }
    }
    hash
}

/// Hash the committed contents of `state`.
///
/// Covers every live block of both buffers: id, generation, size, and
/// committed cell values, integers first. Pending deltas are ignored.
/// An empty state hashes to the FNV-1a offset basis folded with the two
/// buffer tags.
pub fn state_hash(state: &State) -> u64 {
    let mut hash = fnv1a_u64(FNV_OFFSET, 0);
    hash = fold_buffer(hash, state.integers());
    hash = fnv1a_u64(hash, 1);
    fold_buffer(hash, state.bytes())
}
