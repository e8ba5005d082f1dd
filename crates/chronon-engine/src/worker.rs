//! Worker pool and tick hand-off.
//!
//! Every worker is a party of one shared [`Barrier`]. Between ticks the
//! barrier leader blocks on the pending-tick counter while the other
//! workers wait at the barrier; when work arrives all of them run the tick
//! together. The counter is decremented once per tick and `join` waits for
//! it to reach zero.
//!
//! Stopping the pool cancels the barrier. Workers observe the cancellation
//! at their next phase boundary and exit, abandoning any in-flight tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::barrier::Barrier;
use crate::error::ExecutionError;
use crate::pipeline::Pipeline;

/// Everything workers and the owning execution share.
pub(crate) struct Shared {
    pub(crate) pipeline: Pipeline,
    pub(crate) control: Control,
}

#[derive(Default)]
struct Sched {
    pending: u64,
    shutdown: bool,
}

/// Pending-tick counter with wake-ups in both directions.
#[derive(Default)]
pub(crate) struct Control {
    sched: Mutex<Sched>,
    /// Signalled when ticks are added or the pool shuts down.
    work: Condvar,
    /// Signalled when the pending count reaches zero.
    idle: Condvar,
    /// Leader's decision for the current round, read by every worker.
    go: AtomicBool,
}

impl Control {
    fn lock(&self) -> MutexGuard<'_, Sched> {
        self.sched.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `ticks` more ticks for the workers.
    pub(crate) fn add(&self, ticks: u64) {
        let mut sched = self.lock();
        sched.pending = sched.pending.saturating_add(ticks);
        self.work.notify_all();
    }

    /// Block until no ticks are pending.
    pub(crate) fn wait_idle(&self) {
        let mut sched = self.lock();
        while sched.pending > 0 {
            sched = self
                .idle
                .wait(sched)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Leader only: block until there is a tick to run or the pool stops.
    fn await_work(&self) {
        let mut sched = self.lock();
        loop {
            if sched.shutdown {
                self.go.store(false, Ordering::Release);
                return;
            }
            if sched.pending > 0 {
                self.go.store(true, Ordering::Release);
                return;
            }
            sched = self
                .work
                .wait(sched)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn go(&self) -> bool {
        self.go.load(Ordering::Acquire)
    }

    fn tick_done(&self) {
        let mut sched = self.lock();
        sched.pending = sched.pending.saturating_sub(1);
        if sched.pending == 0 {
            self.idle.notify_all();
        }
    }

    /// Drop every pending tick and release joiners.
    fn abandon(&self) {
        self.lock().pending = 0;
        self.idle.notify_all();
    }

    fn shutdown(&self) {
        self.lock().shutdown = true;
        self.work.notify_all();
    }

    fn restart(&self) {
        let mut sched = self.lock();
        sched.shutdown = false;
        sched.pending = 0;
        self.idle.notify_all();
    }
}

/// Marks the execution failed if a worker unwinds, so that the remaining
/// workers and any joiner are released.
struct AbortOnPanic<'a> {
    shared: &'a Shared,
    barrier: &'a Barrier,
}

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.shared.pipeline.fail(ExecutionError::Poisoned);
            self.barrier.cancel();
            self.shared.control.abandon();
        }
    }
}

fn run(shared: Arc<Shared>, barrier: Arc<Barrier>, index: usize) {
    let _abort = AbortOnPanic {
        shared: &shared,
        barrier: &barrier,
    };
    trace!(worker = index, "worker started");
    loop {
        if barrier.once(|| shared.control.await_work()).is_err() || !shared.control.go() {
            break;
        }
        let settled = match shared.pipeline.tick(&barrier) {
            Ok(()) => barrier.once(|| shared.control.tick_done()),
            Err(_) => barrier.once(|| shared.control.abandon()),
        };
        if settled.is_err() {
            break;
        }
    }
    trace!(worker = index, "worker stopped");
}

/// A running set of workers.
pub(crate) struct WorkerPool {
    barrier: Arc<Barrier>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `count` workers. On failure the workers already started are
    /// stopped again.
    pub(crate) fn spawn(shared: &Arc<Shared>, count: usize) -> Result<Self, ExecutionError> {
        let mut pool = Self {
            barrier: Arc::new(Barrier::new(count)),
            handles: Vec::with_capacity(count),
        };
        for index in 0..count {
            let worker_shared = Arc::clone(shared);
            let worker_barrier = Arc::clone(&pool.barrier);
            let spawned = thread::Builder::new()
                .name(format!("chronon-worker-{index}"))
                .spawn(move || run(worker_shared, worker_barrier, index));
            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    pool.stop(shared);
                    return Err(ExecutionError::ThreadSpawnFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(count, "worker pool started");
        Ok(pool)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    /// Stop and join every worker. Pending ticks are dropped.
    pub(crate) fn stop(self, shared: &Shared) {
        shared.control.shutdown();
        self.barrier.cancel();
        let count = self.handles.len();
        for handle in self.handles {
            // A panicked worker has already recorded the failure.
            let _ = handle.join();
        }
        shared.control.restart();
        shared.pipeline.clear_transient();
        debug!(count, "worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tick_done_releases_joiners_at_zero() {
        let control = Arc::new(Control::default());
        control.add(2);
        let joiner = {
            let control = Arc::clone(&control);
            thread::spawn(move || control.wait_idle())
        };
        control.tick_done();
        thread::sleep(Duration::from_millis(10));
        assert!(!joiner.is_finished());
        control.tick_done();
        joiner.join().unwrap();
    }

    #[test]
    fn await_work_reports_shutdown() {
        let control = Control::default();
        control.shutdown();
        control.await_work();
        assert!(!control.go());
        control.restart();
        control.add(1);
        control.await_work();
        assert!(control.go());
    }

    #[test]
    fn abandon_drops_pending_ticks() {
        let control = Control::default();
        control.add(5);
        control.abandon();
        control.wait_idle();
    }
}
