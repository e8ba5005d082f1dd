//! The simulation state container.

use chronon_arena::Buffer;
use chronon_core::{
    Access, ApplyError, BufferError, Byte, Handle, Impact, Integer, ReadWrite,
};
use tracing::{debug, trace};

use crate::config::StateConfig;
use crate::rng::Mt64;

/// Integer and byte buffers plus the deterministic random generator.
///
/// Structural impacts go through [`apply`](ReadWrite::apply) and need
/// exclusive access. Delta impacts can also be applied through
/// [`apply_delta`](State::apply_delta) on a shared reference, from any
/// number of threads. Neither is visible to readers until the buffers are
/// adjusted.
#[derive(Clone, Debug)]
pub struct State {
    integers: Buffer<Integer>,
    bytes: Buffer<Byte>,
    rng: Mt64,
}

impl State {
    /// An empty state seeded from operating system entropy.
    pub fn new() -> Self {
        Self::seeded(rand::random::<u64>())
    }

    /// An empty state with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            integers: Buffer::new(),
            bytes: Buffer::new(),
            rng: Mt64::new(seed),
        }
    }

    /// An empty state from a configuration.
    pub fn with_config(config: &StateConfig) -> Result<Self, BufferError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        debug!(seed, "state created");
        Ok(Self {
            integers: Buffer::with_config(&config.integers)?,
            bytes: Buffer::with_config(&config.bytes)?,
            rng: Mt64::new(seed),
        })
    }

    /// The integer buffer.
    pub fn integers(&self) -> &Buffer<Integer> {
        &self.integers
    }

    /// The byte buffer.
    pub fn bytes(&self) -> &Buffer<Byte> {
        &self.bytes
    }

    /// Apply a delta impact through a shared reference.
    ///
    /// Accepts `Noop` and the `Set`/`Add`/`WriteValues`/`WriteDeltas`
    /// families; anything else is [`ApplyError::WrongImpact`].
    pub fn apply_delta(&self, impact: &Impact) -> Result<(), ApplyError> {
        match impact {
            Impact::Noop => {}
            Impact::IntegerSet {
                handle,
                index,
                value,
            } => self.integers.set(*handle, *index, *value)?,
            Impact::IntegerAdd {
                handle,
                index,
                delta,
            } => self.integers.add(*handle, *index, *delta)?,
            Impact::IntegerWriteValues {
                handle,
                index,
                values,
            } => self.integers.write_values(*handle, *index, values)?,
            Impact::IntegerWriteDeltas {
                handle,
                index,
                deltas,
            } => self.integers.write_deltas(*handle, *index, deltas)?,
            Impact::ByteSet {
                handle,
                index,
                value,
            } => self.bytes.set(*handle, *index, *value)?,
            Impact::ByteAdd {
                handle,
                index,
                delta,
            } => self.bytes.add(*handle, *index, *delta)?,
            Impact::ByteWriteValues {
                handle,
                index,
                values,
            } => self.bytes.write_values(*handle, *index, values)?,
            Impact::ByteWriteDeltas {
                handle,
                index,
                deltas,
            } => self.bytes.write_deltas(*handle, *index, deltas)?,
            other => return Err(ApplyError::WrongImpact { kind: other.kind() }),
        }
        Ok(())
    }

    /// Commit the next chunk of both buffers. Returns `true` while either
    /// buffer has chunks left.
    pub fn adjust(&self) -> bool {
        let integers = self.integers.adjust_chunk();
        let bytes = self.bytes.adjust_chunk();
        integers || bytes
    }

    /// Drop the pending deltas of both buffers.
    pub fn discard_deltas(&self) {
        self.integers.discard_deltas();
        self.bytes.discard_deltas();
    }

    fn write_handle(&self, target: Handle, index: usize, handle: Handle) -> Result<(), BufferError> {
        self.integers
            .write_values(target, index, &[handle.id, handle.generation])
    }

    fn fill_random(
        &mut self,
        min: Integer,
        max: Integer,
        target: Handle,
        index: usize,
        size: usize,
    ) -> Result<(), ApplyError> {
        if max < min {
            return Err(ApplyError::InvalidRandomRange { min, max });
        }
        self.integers.check(target, index, size)?;
        let span = (i128::from(max) - i128::from(min) + 1) as u128;
        let values: Vec<Integer> = (0..size)
            .map(|_| {
                let offset = u128::from(self.rng.next_u64()) % span;
                (i128::from(min) + offset as i128) as Integer
            })
            .collect();
        self.integers.write_values(target, index, &values)?;
        Ok(())
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl Access for State {
    fn integers_size(&self, handle: Handle) -> usize {
        self.integers.block_size(handle)
    }

    fn bytes_size(&self, handle: Handle) -> usize {
        self.bytes.block_size(handle)
    }

    fn read_integers(
        &self,
        handle: Handle,
        index: usize,
        out: &mut [Integer],
    ) -> Result<(), BufferError> {
        self.integers.read(handle, index, out)
    }

    fn read_bytes(&self, handle: Handle, index: usize, out: &mut [Byte]) -> Result<(), BufferError> {
        self.bytes.read(handle, index, out)
    }

    fn get_integer(&self, handle: Handle, index: usize, default: Integer) -> Integer {
        self.integers.get(handle, index, default)
    }

    fn get_byte(&self, handle: Handle, index: usize, default: Byte) -> Byte {
        self.bytes.get(handle, index, default)
    }
}

impl ReadWrite for State {
    fn apply(&mut self, impact: &Impact) -> Result<(), ApplyError> {
        match impact {
            // ── Integers ────────────────────────────────────────
            Impact::IntegerReserve { count } => self.integers.reserve(*count)?,
            Impact::IntegerAllocateInto { handle, size } => {
                let handle = self.integers.allocate_into(*handle, *size)?;
                trace!(%handle, size, "integer block allocated into");
            }
            Impact::IntegerAllocate {
                size,
                return_handle,
                return_index,
            } => {
                self.integers.check(*return_handle, *return_index, 2)?;
                let handle = self.integers.allocate(*size)?;
                self.write_handle(*return_handle, *return_index, handle)?;
                trace!(%handle, size, "integer block allocated");
            }
            Impact::IntegerReallocate { handle, size } => {
                self.integers.reallocate(*handle, *size)?
            }
            Impact::IntegerDeallocate { handle } => self.integers.deallocate(*handle)?,

            // ── Bytes ───────────────────────────────────────────
            Impact::ByteReserve { count } => self.bytes.reserve(*count)?,
            Impact::ByteAllocateInto { handle, size } => {
                let handle = self.bytes.allocate_into(*handle, *size)?;
                trace!(%handle, size, "byte block allocated into");
            }
            Impact::ByteAllocate {
                size,
                return_handle,
                return_index,
            } => {
                self.integers.check(*return_handle, *return_index, 2)?;
                let handle = self.bytes.allocate(*size)?;
                self.write_handle(*return_handle, *return_index, handle)?;
                trace!(%handle, size, "byte block allocated");
            }
            Impact::ByteReallocate { handle, size } => self.bytes.reallocate(*handle, *size)?,
            Impact::ByteDeallocate { handle } => self.bytes.deallocate(*handle)?,

            // ── Randomness ──────────────────────────────────────
            Impact::Seed { seed } => {
                debug!(seed, "state reseeded");
                self.rng.reseed(*seed);
            }
            Impact::Random {
                min,
                max,
                return_handle,
                return_index,
                return_size,
            } => self.fill_random(*min, *max, *return_handle, *return_index, *return_size)?,

            Impact::TickContinue | Impact::QueueAction(_) => {
                return Err(ApplyError::WrongImpact {
                    kind: impact.kind(),
                })
            }
            delta => self.apply_delta(delta)?,
        }
        Ok(())
    }

    fn adjust_loop(&self) {
        self.integers.adjust();
        self.bytes.adjust();
    }

    fn adjust_done(&self) {
        self.integers.adjust_done();
        self.bytes.adjust_done();
    }
}

// Compile-time assertion: State must be shareable across tick workers.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<State>();
};
