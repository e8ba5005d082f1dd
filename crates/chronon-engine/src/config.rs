//! Execution configuration.

use std::thread;

use crate::error::ExecutionError;

/// Configuration for an [`Execution`](crate::Execution).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Number of worker threads. `0` runs every tick inline on the caller.
    pub thread_count: usize,
    /// Maximum workers per available hardware thread.
    pub overthreading_limit: usize,
}

impl ExecutionConfig {
    /// Default worker count: inline execution.
    pub const DEFAULT_THREAD_COUNT: usize = 0;

    /// Default workers allowed per hardware thread.
    pub const DEFAULT_OVERTHREADING_LIMIT: usize = 8;

    /// Configuration with `thread_count` workers.
    pub fn threaded(thread_count: usize) -> Self {
        Self {
            thread_count,
            ..Self::default()
        }
    }

    /// Largest worker count accepted on this machine.
    pub fn max_threads(&self) -> usize {
        let hardware = thread::available_parallelism().map_or(1, |n| n.get());
        self.overthreading_limit.saturating_mul(hardware)
    }

    /// Check `count` against [`max_threads`](Self::max_threads).
    pub fn check_thread_count(&self, count: usize) -> Result<(), ExecutionError> {
        let limit = self.max_threads();
        if count > limit {
            return Err(ExecutionError::InvalidThreadCount {
                requested: count,
                limit,
            });
        }
        Ok(())
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        self.check_thread_count(self.thread_count)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            thread_count: Self::DEFAULT_THREAD_COUNT,
            overthreading_limit: Self::DEFAULT_OVERTHREADING_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inline() {
        let config = ExecutionConfig::default();
        assert_eq!(config.thread_count, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn excessive_thread_count_is_rejected() {
        let config = ExecutionConfig::default();
        assert!(config.check_thread_count(config.max_threads()).is_ok());
        assert!(matches!(
            config.check_thread_count(config.max_threads() + 1),
            Err(ExecutionError::InvalidThreadCount { .. })
        ));
        assert!(config.check_thread_count(usize::MAX).is_err());
    }
}
