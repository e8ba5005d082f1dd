//! Error types shared across the Chronon kernel.
//!
//! Organized by subsystem: buffer access, impact application, and action
//! configuration. Scheduler and controller errors live in their own crates
//! and wrap these.

use std::error::Error;
use std::fmt;

use crate::id::Integer;

/// Errors from buffer allocation and cell access.
///
/// Every buffer operation that returns one of these leaves the buffer in
/// the state it had before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// A zero size, or one whose offset arithmetic would overflow.
    InvalidSize {
        /// The rejected size.
        size: usize,
    },
    /// A zero chunk size.
    InvalidChunkSize {
        /// The rejected chunk size.
        chunk_size: usize,
    },
    /// The handle id is negative, out of range, or not allocated.
    InvalidHandleId {
        /// The rejected id.
        id: i64,
    },
    /// The handle generation does not match the stored generation.
    InvalidHandleGeneration {
        /// The id the handle refers to.
        id: i64,
        /// Generation currently stored for `id`.
        expected: i64,
        /// Generation carried by the handle.
        actual: i64,
    },
    /// The index range falls outside the block.
    InvalidIndex {
        /// First index of the requested range.
        index: usize,
        /// Length of the requested range.
        len: usize,
        /// Size of the block.
        size: usize,
    },
    /// Growing the backing storage failed.
    BadAlloc {
        /// Number of cells requested.
        requested: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { size } => write!(f, "invalid size: {size}"),
            Self::InvalidChunkSize { chunk_size } => {
                write!(f, "invalid chunk size: {chunk_size}")
            }
            Self::InvalidHandleId { id } => write!(f, "invalid handle id: {id}"),
            Self::InvalidHandleGeneration {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "invalid handle generation for id {id}: expected {expected}, got {actual}"
                )
            }
            Self::InvalidIndex { index, len, size } => {
                write!(
                    f,
                    "invalid index range {index}..{} for block of size {size}",
                    index.saturating_add(*len)
                )
            }
            Self::BadAlloc { requested } => {
                write!(f, "allocation of {requested} cells failed")
            }
        }
    }
}

impl Error for BufferError {}

/// Errors from applying an [`Impact`](crate::impact::Impact) to state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyError {
    /// The underlying buffer rejected the operation.
    Buffer(BufferError),
    /// The impact kind cannot be applied to state (for example
    /// `TickContinue`, which only the scheduler consumes).
    WrongImpact {
        /// Name of the offending impact kind.
        kind: &'static str,
    },
    /// A random range with `max < min`.
    InvalidRandomRange {
        /// Lower bound.
        min: Integer,
        /// Upper bound.
        max: Integer,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(e) => write!(f, "buffer: {e}"),
            Self::WrongImpact { kind } => write!(f, "impact {kind} cannot be applied to state"),
            Self::InvalidRandomRange { min, max } => {
                write!(f, "invalid random range: min {min} > max {max}")
            }
        }
    }
}

impl Error for ApplyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for ApplyError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

/// Errors that put an [`Action`](crate::action::Action) into its sticky
/// error state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionError {
    /// Tick duration must be positive.
    InvalidTickDuration {
        /// The rejected duration.
        value: i64,
    },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTickDuration { value } => {
                write!(f, "tick duration must be positive, got {value}")
            }
        }
    }
}

impl Error for ActionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_error_wraps_buffer_error() {
        let e: ApplyError = BufferError::InvalidHandleId { id: -1 }.into();
        assert_eq!(e.to_string(), "buffer: invalid handle id: -1");
        assert!(e.source().is_some());
    }

    #[test]
    fn index_error_reports_range() {
        let e = BufferError::InvalidIndex {
            index: 4,
            len: 2,
            size: 5,
        };
        assert_eq!(e.to_string(), "invalid index range 4..6 for block of size 5");
    }
}
