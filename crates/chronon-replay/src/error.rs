//! Error types for the event controller.

use std::error::Error;
use std::fmt;

use chronon_core::Time;
use chronon_engine::ExecutionError;

/// Errors returned by [`Controller`](crate::Controller) operations.
///
/// Time-ordering violations are rejected before anything changes, so the
/// history and playback position stay as they were.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerError {
    /// An event was queued before the current playback time.
    InvalidEventTime {
        /// Time of the rejected event.
        time: Time,
        /// Current playback time.
        current: Time,
    },
    /// A rewind target was negative.
    InvalidRewindTime {
        /// The rejected target.
        time: Time,
    },
    /// Rewinding into the past without a baseline state to reset to.
    Unsupported,
    /// The underlying execution failed.
    Execution(ExecutionError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEventTime { time, current } => {
                write!(f, "event time {time} is before current time {current}")
            }
            Self::InvalidRewindTime { time } => write!(f, "invalid rewind time {time}"),
            Self::Unsupported => write!(f, "rewind requires a baseline state"),
            Self::Execution(e) => write!(f, "execution failed: {e}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExecutionError> for ControllerError {
    fn from(e: ExecutionError) -> Self {
        Self::Execution(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_errors_are_wrapped_with_source() {
        let err = ControllerError::from(ExecutionError::InvalidTime { time: -3 });
        assert!(matches!(err, ControllerError::Execution(_)));
        assert!(err.source().is_some());
        assert!(ControllerError::Unsupported.source().is_none());
    }

    #[test]
    fn display_names_the_times() {
        let msg = ControllerError::InvalidEventTime {
            time: 2,
            current: 5,
        }
        .to_string();
        assert!(msg.contains('2') && msg.contains('5'));
    }
}
