//! Scheduler error type.

use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

use chronon_core::{ApplyError, Time};

use crate::barrier::BarrierError;

/// Errors from [`Execution`](crate::Execution).
///
/// Errors raised while a tick runs are sticky: once recorded, every
/// following `schedule`, `join` and `queue` returns the same error until
/// the execution is [`reset`](crate::Execution::reset).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// Applying an impact failed. No partial-tick rollback is attempted.
    Apply(ApplyError),
    /// The requested thread count exceeds the overthreading limit.
    InvalidThreadCount {
        /// Requested worker count.
        requested: usize,
        /// Largest accepted worker count on this machine.
        limit: usize,
    },
    /// A negative number of ticks was scheduled.
    InvalidTime {
        /// The rejected tick count.
        time: Time,
    },
    /// The operating system refused to start a worker thread.
    ThreadSpawnFailed {
        /// The spawn error message.
        reason: String,
    },
    /// A lock was poisoned by a panicking thread.
    Poisoned,
    /// The worker pool was stopped while a tick was running.
    Cancelled,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply(e) => write!(f, "apply failed: {e}"),
            Self::InvalidThreadCount { requested, limit } => {
                write!(f, "invalid thread count {requested}, limit is {limit}")
            }
            Self::InvalidTime { time } => write!(f, "invalid time: {time}"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn worker thread: {reason}")
            }
            Self::Poisoned => write!(f, "execution lock poisoned"),
            Self::Cancelled => write!(f, "execution cancelled"),
        }
    }
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Apply(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApplyError> for ExecutionError {
    fn from(e: ApplyError) -> Self {
        Self::Apply(e)
    }
}

impl<T> From<PoisonError<T>> for ExecutionError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

impl From<BarrierError> for ExecutionError {
    fn from(e: BarrierError) -> Self {
        match e {
            BarrierError::Cancelled => Self::Cancelled,
            BarrierError::Poisoned => Self::Poisoned,
        }
    }
}
