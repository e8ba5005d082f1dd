//! Core abstraction traits for reading and mutating simulation state.

use crate::error::{ApplyError, BufferError};
use crate::id::{Byte, Handle, Integer};
use crate::impact::Impact;

/// Read-only view of simulation state.
///
/// This is what generators receive while they run. Every read observes the
/// last committed value; deltas accumulated during the current tick are
/// invisible until the next adjust. Reads never fail loudly: sizes of
/// unknown blocks are zero and `get_*` returns the caller's default.
pub trait Access: Send + Sync {
    /// Size of an integer block, or 0 if `handle` is invalid.
    fn integers_size(&self, handle: Handle) -> usize;

    /// Size of a byte block, or 0 if `handle` is invalid.
    fn bytes_size(&self, handle: Handle) -> usize;

    /// Copy `out.len()` committed integers starting at `index`.
    fn read_integers(
        &self,
        handle: Handle,
        index: usize,
        out: &mut [Integer],
    ) -> Result<(), BufferError>;

    /// Copy `out.len()` committed bytes starting at `index`.
    fn read_bytes(&self, handle: Handle, index: usize, out: &mut [Byte]) -> Result<(), BufferError>;

    /// One committed integer, or `default` if the cell does not exist.
    fn get_integer(&self, handle: Handle, index: usize, default: Integer) -> Integer;

    /// One committed byte, or `default` if the cell does not exist.
    fn get_byte(&self, handle: Handle, index: usize, default: Byte) -> Byte;
}

/// Mutable view of simulation state used by the scheduler.
pub trait ReadWrite: Access {
    /// Apply one impact. On error the state is left unchanged.
    fn apply(&mut self, impact: &Impact) -> Result<(), ApplyError>;

    /// Commit every pending delta.
    fn adjust_loop(&self);

    /// Reset the chunked-commit cursors after a sweep.
    fn adjust_done(&self);
}
