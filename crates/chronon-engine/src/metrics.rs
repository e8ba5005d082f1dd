//! Cumulative scheduler counters.

/// Counters accumulated over the lifetime of an
/// [`Execution`](crate::Execution), reset by
/// [`reset`](crate::Execution::reset).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionMetrics {
    /// Completed ticks.
    pub ticks: u64,
    /// Pipeline iterations; one per tick plus one per continuation.
    pub iterations: u64,
    /// Generator resumptions.
    pub actions_resumed: u64,
    /// Actions that finished and were removed from the queue.
    pub actions_finished: u64,
    /// Sync impacts applied in order.
    pub sync_applied: u64,
    /// Async impacts applied.
    pub async_applied: u64,
    /// Actions forked through `QueueAction`.
    pub forks: u64,
}
