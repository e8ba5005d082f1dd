//! The user-facing scheduler.

use std::fmt;
use std::sync::{Arc, RwLockReadGuard};

use chronon_core::{Action, Time};
use chronon_state::State;
use tracing::debug;

use crate::barrier::Barrier;
use crate::config::ExecutionConfig;
use crate::error::ExecutionError;
use crate::metrics::ExecutionMetrics;
use crate::pipeline::Pipeline;
use crate::worker::{Control, Shared, WorkerPool};

/// Runs queued actions against a [`State`], one tick at a time.
///
/// With zero worker threads every [`schedule`](Self::schedule) call runs
/// its ticks on the calling thread before returning. With workers,
/// `schedule` only hands the ticks over and [`join`](Self::join) waits for
/// them. Both modes run the same pipeline and produce the same state.
///
/// # Examples
///
/// ```
/// use chronon_core::{Action, Access, Handle, Impact, ImpactList};
/// use chronon_engine::Execution;
/// use chronon_state::State;
/// use smallvec::smallvec;
///
/// let exe = Execution::new(State::seeded(1));
/// exe.queue(Action::from_fn(|_| {
///     let mut done = false;
///     move |_: &dyn Access| -> Option<ImpactList> {
///         if done {
///             return None;
///         }
///         done = true;
///         Some(smallvec![
///             Impact::IntegerAllocateInto { handle: Handle::unused(0), size: 1 },
///             Impact::IntegerSet { handle: Handle::new(0, 0), index: 0, value: 42 },
///         ])
///     }
/// }))
/// .unwrap();
/// exe.schedule_and_join(1).unwrap();
/// assert_eq!(exe.read().unwrap().get_integer(Handle::new(0, 0), 0, -1), 42);
/// ```
pub struct Execution {
    config: ExecutionConfig,
    shared: Arc<Shared>,
    pool: Option<WorkerPool>,
    inline: Barrier,
}

impl Execution {
    /// An inline execution over `state`.
    pub fn new(state: State) -> Self {
        Self {
            config: ExecutionConfig::default(),
            shared: Arc::new(Shared {
                pipeline: Pipeline::new(state),
                control: Control::default(),
            }),
            pool: None,
            inline: Barrier::new(1),
        }
    }

    /// An execution over `state` with `config.thread_count` workers.
    pub fn with_config(state: State, config: ExecutionConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        let mut exe = Self::new(state);
        exe.config.overthreading_limit = config.overthreading_limit;
        exe.set_thread_count(config.thread_count)?;
        Ok(exe)
    }

    /// Current configuration.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Number of running workers. Zero means inline execution.
    pub fn thread_count(&self) -> usize {
        self.pool.as_ref().map_or(0, WorkerPool::len)
    }

    /// Replace the worker pool.
    ///
    /// Running workers are stopped first; ticks they had not finished are
    /// dropped. If a worker fails to start the execution falls back to
    /// inline mode.
    pub fn set_thread_count(&mut self, count: usize) -> Result<(), ExecutionError> {
        self.config.check_thread_count(count)?;
        self.stop_workers();
        self.config.thread_count = 0;
        if count > 0 {
            self.pool = Some(WorkerPool::spawn(&self.shared, count)?);
            self.config.thread_count = count;
        }
        debug!(count, "thread count set");
        Ok(())
    }

    /// Add an action. It is first resumed on the next tick.
    ///
    /// With workers running this waits for scheduled ticks to finish.
    pub fn queue(&self, action: Action) -> Result<(), ExecutionError> {
        if self.pool.is_some() {
            self.shared.control.wait_idle();
        }
        self.shared.pipeline.check()?;
        self.shared.pipeline.push(&action)
    }

    /// Number of actions in the queue, finished ones included until the
    /// end of the tick that finished them.
    pub fn queue_len(&self) -> usize {
        self.shared.pipeline.queue_len()
    }

    /// Advance by `time` ticks.
    pub fn schedule(&self, time: Time) -> Result<(), ExecutionError> {
        if time < 0 {
            return Err(ExecutionError::InvalidTime { time });
        }
        self.shared.pipeline.check()?;
        if time == 0 {
            return Ok(());
        }
        match &self.pool {
            None => {
                for _ in 0..time {
                    self.shared.pipeline.tick(&self.inline)?;
                }
            }
            Some(_) => self.shared.control.add(time as u64),
        }
        Ok(())
    }

    /// Wait until every scheduled tick has run.
    pub fn join(&self) -> Result<(), ExecutionError> {
        self.shared.control.wait_idle();
        self.shared.pipeline.check()
    }

    /// [`schedule`](Self::schedule) then [`join`](Self::join).
    pub fn schedule_and_join(&self, time: Time) -> Result<(), ExecutionError> {
        self.schedule(time)?;
        self.join()
    }

    /// Read access to the state.
    ///
    /// While workers are running ticks the view may be mid-commit; call
    /// [`join`](Self::join) first for a consistent snapshot.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, State>, ExecutionError> {
        self.shared.pipeline.state()
    }

    /// Replace the state, drop every queued action, and clear the sticky
    /// error and the metrics. Workers are restarted.
    pub fn reset(&mut self, state: State) -> Result<(), ExecutionError> {
        let count = self.thread_count();
        self.stop_workers();
        self.shared.pipeline.reset(state);
        debug!("execution reset");
        self.set_thread_count(count)
    }

    /// The sticky error, if any.
    pub fn status(&self) -> Result<(), ExecutionError> {
        self.shared.pipeline.check()
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> ExecutionMetrics {
        self.shared.pipeline.metrics()
    }

    fn stop_workers(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.stop(&self.shared);
        }
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new(State::new())
    }
}

impl Drop for Execution {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("thread_count", &self.thread_count())
            .field("queue_len", &self.queue_len())
            .field("status", &self.status().err())
            .finish()
    }
}

// Compile-time assertion: an execution can be moved to and shared with
// other threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Execution>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chronon_core::{Access, Handle, Impact};
    use chronon_test_utils::fixtures::{alloc_into, scripted, set};
    use smallvec::smallvec;

    fn cell(exe: &Execution, id: i64) -> i64 {
        exe.read()
            .unwrap()
            .get_integer(Handle::new(id, 0), 0, -1)
    }

    fn alloc(id: i64) -> Impact {
        alloc_into(id, 1)
    }

    #[test]
    fn default_is_inline() {
        let exe = Execution::new(State::seeded(0));
        assert_eq!(exe.thread_count(), 0);
        assert!(exe.status().is_ok());
    }

    #[test]
    fn set_thread_count_spawns_and_stops() {
        let mut exe = Execution::new(State::seeded(0));
        exe.set_thread_count(4).unwrap();
        assert_eq!(exe.thread_count(), 4);
        exe.set_thread_count(0).unwrap();
        assert_eq!(exe.thread_count(), 0);
    }

    #[test]
    fn excessive_thread_count_is_rejected() {
        let mut exe = Execution::new(State::seeded(0));
        let limit = exe.config().max_threads();
        assert!(matches!(
            exe.set_thread_count(limit + 1),
            Err(ExecutionError::InvalidThreadCount { .. })
        ));
        assert_eq!(exe.thread_count(), 0);
    }

    #[test]
    fn negative_time_is_rejected() {
        let exe = Execution::new(State::seeded(0));
        assert_eq!(
            exe.schedule(-1),
            Err(ExecutionError::InvalidTime { time: -1 })
        );
    }

    #[test]
    fn queued_action_runs_on_next_tick() {
        let exe = Execution::new(State::seeded(0));
        exe.queue(scripted(vec![smallvec![alloc(0), set(0, 0, 42)]]))
            .unwrap();
        exe.schedule_and_join(0).unwrap();
        assert_eq!(cell(&exe, 0), -1);
        exe.schedule_and_join(1).unwrap();
        assert_eq!(cell(&exe, 0), 42);
    }

    #[test]
    fn second_step_waits_for_tick_duration() {
        let exe = Execution::new(State::seeded(0));
        exe.queue(scripted(vec![smallvec![alloc(0), set(0, 0, 42)], smallvec![set(0, 0, 43)]]))
            .unwrap();
        exe.schedule_and_join(1).unwrap();
        assert_eq!(cell(&exe, 0), 42);
        exe.schedule_and_join(Action::DEFAULT_TICK_DURATION - 1).unwrap();
        assert_eq!(cell(&exe, 0), 42);
        exe.schedule_and_join(1).unwrap();
        assert_eq!(cell(&exe, 0), 43);
    }

    #[test]
    fn reset_clears_queue_and_error() {
        let mut exe = Execution::new(State::seeded(0));
        exe.queue(scripted(vec![smallvec![set(5, 0, 1)]])).unwrap();
        assert!(exe.schedule_and_join(1).is_err());
        assert!(exe.queue(Action::new()).is_err());
        exe.reset(State::seeded(0)).unwrap();
        assert_eq!(exe.queue_len(), 0);
        assert_eq!(exe.metrics(), ExecutionMetrics::default());
        assert!(exe.schedule_and_join(1).is_ok());
    }

    #[test]
    fn metrics_count_work() {
        let exe = Execution::new(State::seeded(0));
        exe.queue(scripted(vec![smallvec![alloc(0), set(0, 0, 1), Impact::TickContinue]]))
            .unwrap();
        exe.schedule_and_join(2).unwrap();
        let m = exe.metrics();
        assert_eq!(m.ticks, 2);
        assert_eq!(m.iterations, 3);
        assert_eq!(m.sync_applied, 1);
        assert_eq!(m.async_applied, 1);
        assert_eq!(m.actions_finished, 1);
    }
}
