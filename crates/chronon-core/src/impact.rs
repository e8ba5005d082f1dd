//! The closed vocabulary of state mutation requests.
//!
//! An [`Impact`] is pure data: it describes one change an action wants to
//! make. The scheduler sorts impacts by [`ImpactMode`] and the state applies
//! them; nothing here has behavior beyond classification.

use smallvec::SmallVec;

use crate::action::Action;
use crate::id::{Byte, Handle, Integer};

/// Impacts produced by one generator resumption.
///
/// Most resumptions yield a handful of impacts, so the first four live
/// inline.
pub type ImpactList = SmallVec<[Impact; 4]>;

/// How the scheduler must order an impact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImpactMode {
    /// Commutative delta writes; applied in any order, in parallel.
    Async,
    /// Structural changes; applied one at a time in action order.
    Sync,
    /// Consumed by the scheduler; never reaches state.
    Control,
}

/// A single, minimal state mutation request.
///
/// Handles returned by allocation are written back into integer cells of
/// `return_handle`: the id at `return_index` and the generation at
/// `return_index + 1`. Both writes are deltas and become visible after the
/// next adjust.
#[derive(Clone, Debug, PartialEq)]
pub enum Impact {
    /// Does nothing.
    Noop,
    /// Run the producing action again within the same tick.
    TickContinue,

    // ── Integers ────────────────────────────────────────────────

    /// Reserve integer ids `0..count` for `IntegerAllocateInto`.
    IntegerReserve {
        /// Number of reserved ids.
        count: usize,
    },
    /// Allocate an integer block under a caller-chosen id.
    IntegerAllocateInto {
        /// Target id with its current generation (`-1` if never used).
        handle: Handle,
        /// Block size in cells.
        size: usize,
    },
    /// Allocate an integer block under the next free id.
    IntegerAllocate {
        /// Block size in cells.
        size: usize,
        /// Integer block receiving the new handle.
        return_handle: Handle,
        /// Cell index of the id; the generation goes to the next cell.
        return_index: usize,
    },
    /// Resize an integer block, keeping its id and generation.
    IntegerReallocate {
        /// Block to resize.
        handle: Handle,
        /// New size in cells.
        size: usize,
    },
    /// Free an integer block.
    IntegerDeallocate {
        /// Block to free.
        handle: Handle,
    },
    /// Set one integer cell.
    IntegerSet {
        /// Target block.
        handle: Handle,
        /// Cell index within the block.
        index: usize,
        /// New value.
        value: Integer,
    },
    /// Add to one integer cell.
    IntegerAdd {
        /// Target block.
        handle: Handle,
        /// Cell index within the block.
        index: usize,
        /// Amount to add.
        delta: Integer,
    },
    /// Set a run of integer cells.
    IntegerWriteValues {
        /// Target block.
        handle: Handle,
        /// Index of the first cell.
        index: usize,
        /// New values, one per cell.
        values: Vec<Integer>,
    },
    /// Add to a run of integer cells.
    IntegerWriteDeltas {
        /// Target block.
        handle: Handle,
        /// Index of the first cell.
        index: usize,
        /// Amounts to add, one per cell.
        deltas: Vec<Integer>,
    },

    // ── Bytes ───────────────────────────────────────────────────

    /// Reserve byte ids `0..count` for `ByteAllocateInto`.
    ByteReserve {
        /// Number of reserved ids.
        count: usize,
    },
    /// Allocate a byte block under a caller-chosen id.
    ByteAllocateInto {
        /// Target id with its current generation (`-1` if never used).
        handle: Handle,
        /// Block size in cells.
        size: usize,
    },
    /// Allocate a byte block under the next free id.
    ByteAllocate {
        /// Block size in cells.
        size: usize,
        /// Integer block receiving the new handle.
        return_handle: Handle,
        /// Cell index of the id; the generation goes to the next cell.
        return_index: usize,
    },
    /// Resize a byte block, keeping its id and generation.
    ByteReallocate {
        /// Block to resize.
        handle: Handle,
        /// New size in cells.
        size: usize,
    },
    /// Free a byte block.
    ByteDeallocate {
        /// Block to free.
        handle: Handle,
    },
    /// Set one byte cell.
    ByteSet {
        /// Target block.
        handle: Handle,
        /// Cell index within the block.
        index: usize,
        /// New value.
        value: Byte,
    },
    /// Add to one byte cell.
    ByteAdd {
        /// Target block.
        handle: Handle,
        /// Cell index within the block.
        index: usize,
        /// Amount to add.
        delta: Byte,
    },
    /// Set a run of byte cells.
    ByteWriteValues {
        /// Target block.
        handle: Handle,
        /// Index of the first cell.
        index: usize,
        /// New values, one per cell.
        values: Vec<Byte>,
    },
    /// Add to a run of byte cells.
    ByteWriteDeltas {
        /// Target block.
        handle: Handle,
        /// Index of the first cell.
        index: usize,
        /// Amounts to add, one per cell.
        deltas: Vec<Byte>,
    },

    // ── Randomness and scheduling ───────────────────────────────

    /// Reseed the state random number generator.
    Seed {
        /// New seed.
        seed: u64,
    },
    /// Fill integer cells with uniform values in `min..=max`.
    Random {
        /// Inclusive lower bound.
        min: Integer,
        /// Inclusive upper bound.
        max: Integer,
        /// Integer block receiving the values.
        return_handle: Handle,
        /// Index of the first cell to fill.
        return_index: usize,
        /// Number of cells to fill.
        return_size: usize,
    },
    /// Start a new action in the scheduler.
    QueueAction(Action),
}

impl Impact {
    /// Scheduling mode of this impact.
    pub fn mode(&self) -> ImpactMode {
        match self {
            Self::TickContinue => ImpactMode::Control,
            Self::Noop
            | Self::IntegerSet { .. }
            | Self::IntegerAdd { .. }
            | Self::IntegerWriteValues { .. }
            | Self::IntegerWriteDeltas { .. }
            | Self::ByteSet { .. }
            | Self::ByteAdd { .. }
            | Self::ByteWriteValues { .. }
            | Self::ByteWriteDeltas { .. } => ImpactMode::Async,
            Self::IntegerReserve { .. }
            | Self::IntegerAllocateInto { .. }
            | Self::IntegerAllocate { .. }
            | Self::IntegerReallocate { .. }
            | Self::IntegerDeallocate { .. }
            | Self::ByteReserve { .. }
            | Self::ByteAllocateInto { .. }
            | Self::ByteAllocate { .. }
            | Self::ByteReallocate { .. }
            | Self::ByteDeallocate { .. }
            | Self::Seed { .. }
            | Self::Random { .. }
            | Self::QueueAction(_) => ImpactMode::Sync,
        }
    }

    /// Short name of the variant, for errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Noop => "Noop",
            Self::TickContinue => "TickContinue",
            Self::IntegerReserve { .. } => "IntegerReserve",
            Self::IntegerAllocateInto { .. } => "IntegerAllocateInto",
            Self::IntegerAllocate { .. } => "IntegerAllocate",
            Self::IntegerReallocate { .. } => "IntegerReallocate",
            Self::IntegerDeallocate { .. } => "IntegerDeallocate",
            Self::IntegerSet { .. } => "IntegerSet",
            Self::IntegerAdd { .. } => "IntegerAdd",
            Self::IntegerWriteValues { .. } => "IntegerWriteValues",
            Self::IntegerWriteDeltas { .. } => "IntegerWriteDeltas",
            Self::ByteReserve { .. } => "ByteReserve",
            Self::ByteAllocateInto { .. } => "ByteAllocateInto",
            Self::ByteAllocate { .. } => "ByteAllocate",
            Self::ByteReallocate { .. } => "ByteReallocate",
            Self::ByteDeallocate { .. } => "ByteDeallocate",
            Self::ByteSet { .. } => "ByteSet",
            Self::ByteAdd { .. } => "ByteAdd",
            Self::ByteWriteValues { .. } => "ByteWriteValues",
            Self::ByteWriteDeltas { .. } => "ByteWriteDeltas",
            Self::Seed { .. } => "Seed",
            Self::Random { .. } => "Random",
            Self::QueueAction(_) => "QueueAction",
        }
    }

    /// Whether the scheduler must apply this impact in action order.
    pub fn is_sync(&self) -> bool {
        self.mode() == ImpactMode::Sync
    }
}

impl From<Action> for Impact {
    fn from(action: Action) -> Self {
        Self::QueueAction(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_async() {
        let h = Handle::new(0, 0);
        assert_eq!(
            Impact::IntegerSet {
                handle: h,
                index: 0,
                value: 1
            }
            .mode(),
            ImpactMode::Async
        );
        assert_eq!(
            Impact::ByteWriteDeltas {
                handle: h,
                index: 0,
                deltas: vec![1, 2]
            }
            .mode(),
            ImpactMode::Async
        );
        assert_eq!(Impact::Noop.mode(), ImpactMode::Async);
    }

    #[test]
    fn structural_changes_are_sync() {
        let h = Handle::new(0, 0);
        assert!(Impact::IntegerReserve { count: 4 }.is_sync());
        assert!(Impact::ByteDeallocate { handle: h }.is_sync());
        assert!(Impact::Seed { seed: 7 }.is_sync());
        assert!(Impact::QueueAction(Action::new()).is_sync());
        assert!(Impact::Random {
            min: 0,
            max: 1,
            return_handle: h,
            return_index: 0,
            return_size: 1,
        }
        .is_sync());
    }

    #[test]
    fn tick_continue_is_control() {
        assert_eq!(Impact::TickContinue.mode(), ImpactMode::Control);
        assert_eq!(Impact::TickContinue.kind(), "TickContinue");
    }

    #[test]
    fn impact_list_keeps_small_lists_inline() {
        let list: ImpactList = smallvec::smallvec![Impact::Noop, Impact::TickContinue];
        assert!(!list.spilled());
        assert_eq!(list.len(), 2);
    }
}
