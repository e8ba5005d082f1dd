//! Generational block buffer with two-phase cell commit.
//!
//! A [`Buffer`] is one contiguous vector of cells carved into blocks. Each
//! block is addressed by a [`Handle`]; the id indexes a block table and the
//! generation guards against stale handles. Every cell holds a committed
//! value and a pending delta:
//!
//! - Writes (`set`, `add`, `write_*`) only touch deltas, atomically, so any
//!   number of threads may write through `&self` concurrently.
//! - Reads (`get`, `read`) only see committed values.
//! - [`adjust_chunk`](Buffer::adjust_chunk) folds deltas into values one
//!   chunk at a time; threads claim chunks from a shared cursor.
//!
//! Structural operations (allocation, reallocation, freeing) take
//! `&mut self` and either succeed or leave the buffer unchanged.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use chronon_core::{BufferError, Handle};

use crate::config::BufferConfig;
use crate::runs::RunMap;
use crate::scalar::Scalar;

struct Cell<T: Scalar> {
    value: T::Atomic,
    delta: T::Atomic,
}

impl<T: Scalar> Cell<T> {
    fn new(value: T) -> Self {
        Self {
            value: T::new_atomic(value),
            delta: T::new_atomic(T::ZERO),
        }
    }

    fn clear(&self) {
        T::store(&self.value, T::ZERO);
        T::store(&self.delta, T::ZERO);
    }

    fn commit(&self) {
        let delta = T::take(&self.delta);
        if delta != T::ZERO {
            T::store(&self.value, T::load(&self.value).wrapping_add(delta));
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Block {
    /// First cell of the block, `None` when the id is not allocated.
    offset: Option<usize>,
    /// Last issued generation, `-1` if never allocated.
    generation: i64,
    size: usize,
}

impl Block {
    const VACANT: Block = Block {
        offset: None,
        generation: -1,
        size: 0,
    };
}

/// Generational block buffer of `T` cells.
pub struct Buffer<T: Scalar> {
    chunk_size: usize,
    reserved: usize,
    next_block: usize,
    next_chunk: AtomicUsize,
    blocks: Vec<Block>,
    runs: RunMap,
    cells: Vec<Cell<T>>,
}

impl<T: Scalar> Buffer<T> {
    /// An empty buffer with the default chunk size for `T`.
    pub fn new() -> Self {
        Self::empty(BufferConfig::for_scalar::<T>().chunk_size)
    }

    /// An empty buffer with the given configuration.
    pub fn with_config(config: &BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        Ok(Self::empty(config.chunk_size))
    }

    fn empty(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            reserved: 0,
            next_block: 0,
            next_chunk: AtomicUsize::new(0),
            blocks: Vec::new(),
            runs: RunMap::default(),
            cells: Vec::new(),
        }
    }

    // ── Introspection ───────────────────────────────────────────

    /// Number of cells committed per [`adjust_chunk`](Self::adjust_chunk).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Change the chunk size. Zero is rejected.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<(), BufferError> {
        BufferConfig::with_chunk_size(chunk_size).validate()?;
        self.chunk_size = chunk_size;
        Ok(())
    }

    /// Total cells, free and allocated.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Cells not owned by any block.
    pub fn free_cells(&self) -> usize {
        self.runs.free_cells()
    }

    /// Ids below this count are only reachable through
    /// [`allocate_into`](Self::allocate_into).
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Size of the block behind `handle`, or 0 if the handle is invalid.
    pub fn block_size(&self, handle: Handle) -> usize {
        self.block(handle).map_or(0, |(_, block)| block.size)
    }

    /// Every allocated block with its current handle and size, by id.
    pub fn live_blocks(&self) -> impl Iterator<Item = (Handle, usize)> + '_ {
        self.blocks.iter().enumerate().filter_map(|(id, block)| {
            block
                .offset
                .map(|_| (Handle::new(id as i64, block.generation), block.size))
        })
    }

    /// Validate `handle` and the range `index..index + len`, returning the
    /// cell offset of `index`.
    pub fn check(&self, handle: Handle, index: usize, len: usize) -> Result<usize, BufferError> {
        let (offset, block) = self.block(handle)?;
        match index.checked_add(len) {
            Some(end) if end <= block.size => Ok(offset + index),
            _ => Err(BufferError::InvalidIndex {
                index,
                len,
                size: block.size,
            }),
        }
    }

    fn block(&self, handle: Handle) -> Result<(usize, &Block), BufferError> {
        let invalid = BufferError::InvalidHandleId { id: handle.id };
        let id = usize::try_from(handle.id).map_err(|_| invalid.clone())?;
        let block = self.blocks.get(id).ok_or_else(|| invalid.clone())?;
        let offset = block.offset.ok_or(invalid)?;
        if block.generation != handle.generation {
            return Err(BufferError::InvalidHandleGeneration {
                id: handle.id,
                expected: block.generation,
                actual: handle.generation,
            });
        }
        Ok((offset, block))
    }

    // ── Structure ───────────────────────────────────────────────

    /// Reserve ids `0..count`. [`allocate`](Self::allocate) never hands
    /// them out; they are filled with [`allocate_into`](Self::allocate_into).
    pub fn reserve(&mut self, count: usize) -> Result<(), BufferError> {
        self.ensure_blocks(count)?;
        self.reserved = count;
        self.next_block = self.next_block.max(count);
        self.advance_next_block();
        Ok(())
    }

    /// Allocate a zeroed block of `size` cells under the lowest free id at
    /// or above the allocation cursor.
    pub fn allocate(&mut self, size: usize) -> Result<Handle, BufferError> {
        if size == 0 {
            return Err(BufferError::InvalidSize { size });
        }
        let id = self.next_block;
        self.ensure_blocks(id + 1)?;
        self.ensure_cells(size)?;
        Ok(self.place(id, size))
    }

    /// Allocate a zeroed block of `size` cells under the id of `handle`.
    ///
    /// `handle.generation` must be the id's current generation, or `-1` for
    /// an id that has never been allocated. Any block currently held by the
    /// id is freed first. The returned handle carries the next generation.
    pub fn allocate_into(&mut self, handle: Handle, size: usize) -> Result<Handle, BufferError> {
        let id = usize::try_from(handle.id)
            .map_err(|_| BufferError::InvalidHandleId { id: handle.id })?;
        let expected = self.blocks.get(id).map_or(-1, |b| b.generation);
        if handle.generation != expected {
            return Err(BufferError::InvalidHandleGeneration {
                id: handle.id,
                expected,
                actual: handle.generation,
            });
        }
        if size == 0 {
            return Err(BufferError::InvalidSize { size });
        }
        let blocks_needed = id
            .checked_add(1)
            .ok_or(BufferError::InvalidHandleId { id: handle.id })?;
        self.ensure_blocks(blocks_needed)?;
        self.ensure_cells(size)?;
        if let Some(offset) = self.blocks[id].offset.take() {
            self.runs.release(offset);
        }
        Ok(self.place(id, size))
    }

    /// Resize the block behind `handle`, keeping its id and generation.
    ///
    /// The first `min(old, new)` values and pending deltas are preserved;
    /// any new cells are zero.
    pub fn reallocate(&mut self, handle: Handle, size: usize) -> Result<(), BufferError> {
        if size == 0 {
            return Err(BufferError::InvalidSize { size });
        }
        let (old_offset, block) = self.block(handle)?;
        let old_size = block.size;
        self.ensure_cells(size)?;

        let new_offset = self.claim_cells(size);
        for i in 0..old_size.min(size) {
            let (from, to) = (&self.cells[old_offset + i], &self.cells[new_offset + i]);
            T::store(&to.value, T::load(&from.value));
            T::store(&to.delta, T::load(&from.delta));
        }
        self.runs.release(old_offset);

        let block = &mut self.blocks[handle.id as usize];
        block.offset = Some(new_offset);
        block.size = size;
        Ok(())
    }

    /// Free the block behind `handle`.
    pub fn deallocate(&mut self, handle: Handle) -> Result<(), BufferError> {
        let (offset, _) = self.block(handle)?;
        let id = handle.id as usize;
        self.runs.release(offset);
        self.blocks[id].offset = None;
        self.blocks[id].size = 0;
        if id >= self.reserved && id < self.next_block {
            self.next_block = id;
        }
        Ok(())
    }

    fn ensure_blocks(&mut self, count: usize) -> Result<(), BufferError> {
        if count > self.blocks.len() {
            self.blocks
                .try_reserve(count - self.blocks.len())
                .map_err(|_| BufferError::BadAlloc { requested: count })?;
            self.blocks.resize(count, Block::VACANT);
        }
        Ok(())
    }

    /// Make room for `size` more cells so that [`claim_cells`] cannot fail.
    fn ensure_cells(&mut self, size: usize) -> Result<(), BufferError> {
        let bad = |_| BufferError::BadAlloc { requested: size };
        self.cells.try_reserve(size).map_err(bad)?;
        self.runs.try_reserve(size).map_err(bad)?;
        Ok(())
    }

    fn claim_cells(&mut self, size: usize) -> usize {
        let offset = match self.runs.find(size) {
            Some(offset) => offset,
            None => {
                let offset = self.runs.grow_offset();
                let new_len = offset + size;
                self.cells.resize_with(new_len, || Cell::new(T::ZERO));
                self.runs.grow_to(new_len);
                offset
            }
        };
        self.runs.occupy(offset, size);
        for cell in &self.cells[offset..offset + size] {
            cell.clear();
        }
        offset
    }

    fn place(&mut self, id: usize, size: usize) -> Handle {
        let offset = self.claim_cells(size);
        let block = &mut self.blocks[id];
        block.offset = Some(offset);
        block.size = size;
        block.generation += 1;
        let handle = Handle::new(id as i64, block.generation);
        self.advance_next_block();
        handle
    }

    fn advance_next_block(&mut self) {
        while self
            .blocks
            .get(self.next_block)
            .is_some_and(|b| b.offset.is_some())
        {
            self.next_block += 1;
        }
    }

    // ── Cells ───────────────────────────────────────────────────

    /// Committed value of one cell, or `default` if it does not exist.
    pub fn get(&self, handle: Handle, index: usize, default: T) -> T {
        match self.check(handle, index, 1) {
            Ok(offset) => T::load(&self.cells[offset].value),
            Err(_) => default,
        }
    }

    /// Copy committed values starting at `index` into `out`.
    pub fn read(&self, handle: Handle, index: usize, out: &mut [T]) -> Result<(), BufferError> {
        let offset = self.check(handle, index, out.len())?;
        for (dst, cell) in out.iter_mut().zip(&self.cells[offset..]) {
            *dst = T::load(&cell.value);
        }
        Ok(())
    }

    /// Schedule one cell to become `value` at the next commit.
    ///
    /// Implemented as a delta against the committed value, so a `set` and
    /// an `add` on the same cell within one tick both take effect.
    pub fn set(&self, handle: Handle, index: usize, value: T) -> Result<(), BufferError> {
        let offset = self.check(handle, index, 1)?;
        let cell = &self.cells[offset];
        T::fetch_add(&cell.delta, value.wrapping_sub(T::load(&cell.value)));
        Ok(())
    }

    /// Schedule `delta` to be added to one cell at the next commit.
    pub fn add(&self, handle: Handle, index: usize, delta: T) -> Result<(), BufferError> {
        let offset = self.check(handle, index, 1)?;
        T::fetch_add(&self.cells[offset].delta, delta);
        Ok(())
    }

    /// [`set`](Self::set) for a run of cells.
    pub fn write_values(&self, handle: Handle, index: usize, values: &[T]) -> Result<(), BufferError> {
        let offset = self.check(handle, index, values.len())?;
        for (cell, &value) in self.cells[offset..].iter().zip(values) {
            T::fetch_add(&cell.delta, value.wrapping_sub(T::load(&cell.value)));
        }
        Ok(())
    }

    /// [`add`](Self::add) for a run of cells.
    pub fn write_deltas(&self, handle: Handle, index: usize, deltas: &[T]) -> Result<(), BufferError> {
        let offset = self.check(handle, index, deltas.len())?;
        for (cell, &delta) in self.cells[offset..].iter().zip(deltas) {
            T::fetch_add(&cell.delta, delta);
        }
        Ok(())
    }

    // ── Commit ──────────────────────────────────────────────────

    /// Commit the next unclaimed chunk of cells.
    ///
    /// Safe to call from many threads at once; each chunk is claimed by
    /// exactly one caller. Returns `false` once the caller found nothing
    /// left or committed the final chunk. The cursor does not rewind on its
    /// own: call [`adjust_done`](Self::adjust_done) after every participant
    /// has stopped.
    pub fn adjust_chunk(&self) -> bool {
        let size = self.cells.len();
        let begin = self.next_chunk.fetch_add(self.chunk_size, Ordering::AcqRel);
        if begin >= size {
            return false;
        }
        let end = begin.saturating_add(self.chunk_size).min(size);
        for cell in &self.cells[begin..end] {
            cell.commit();
        }
        end < size
    }

    /// Rewind the chunk cursor.
    pub fn adjust_done(&self) {
        self.next_chunk.store(0, Ordering::Release);
    }

    /// Commit every cell and rewind the chunk cursor.
    pub fn adjust(&self) {
        for cell in &self.cells {
            cell.commit();
        }
        self.adjust_done();
    }

    /// Drop every pending delta and rewind the chunk cursor. Committed
    /// values are untouched.
    pub fn discard_deltas(&self) {
        for cell in &self.cells {
            T::store(&cell.delta, T::ZERO);
        }
        self.adjust_done();
    }
}

impl<T: Scalar> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones committed values; pending deltas are dropped.
impl<T: Scalar> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            chunk_size: self.chunk_size,
            reserved: self.reserved,
            next_block: self.next_block,
            next_chunk: AtomicUsize::new(0),
            blocks: self.blocks.clone(),
            runs: self.runs.clone(),
            cells: self
                .cells
                .iter()
                .map(|c| Cell::new(T::load(&c.value)))
                .collect(),
        }
    }
}

impl<T: Scalar> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.cells.len())
            .field("free", &self.runs.free_cells())
            .field("blocks", &self.live_blocks().count())
            .field("reserved", &self.reserved)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

// Compile-time assertion: Buffer must be shareable across tick workers.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Buffer<i64>>();
    assert::<Buffer<i8>>();
};
