//! The tick pipeline shared by every participant.
//!
//! One tick repeats the following iteration until no action asks to
//! continue:
//!
//! ```text
//! dispatch      (parallel)  resume due actions, sort impacts into buckets
//! ── once ──                apply sync impacts in action order
//! apply async   (parallel)  delta impacts, any order
//! ── wait ──
//! adjust        (parallel)  commit deltas chunk by chunk
//! ── once ──                rewind chunk cursors, merge forks
//! ```
//!
//! and then closes with a single-threaded step that drops finished actions,
//! renumbers the queue, and counts every clock down by one.
//!
//! Phase failures are recorded in a sticky status instead of being returned
//! straight away. Every participant checks the status right after the same
//! barrier, so they all abandon the tick at the same point.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};

use chronon_core::{Action, Generator, Impact, ImpactList, ReadWrite, Time};
use chronon_state::State;
use tracing::{error, trace};

use crate::barrier::Barrier;
use crate::error::ExecutionError;
use crate::metrics::ExecutionMetrics;

/// A queued action instance.
struct Entry {
    generator: Box<dyn Generator>,
    /// Position in the queue at the start of the tick; orders sync impacts.
    order: usize,
    /// Ticks until the next resumption. Zero means due.
    clock: Time,
    tick_duration: Time,
    finished: bool,
}

impl Entry {
    fn new(action: &Action, order: usize) -> Self {
        Self {
            generator: action.run(),
            order,
            clock: 0,
            tick_duration: action.tick_duration(),
            finished: false,
        }
    }
}

/// Impacts collected during dispatch.
#[derive(Default)]
struct Buckets {
    /// Sorted by order; equal orders keep yield order.
    sync: Vec<(usize, Impact)>,
    deltas: Vec<Impact>,
    /// Sorted by parent order; equal orders keep yield order.
    forks: Vec<(usize, Action)>,
    continued: bool,
}

impl Buckets {
    fn insert_sorted<T>(list: &mut Vec<(usize, T)>, order: usize, item: T) {
        let at = list.partition_point(|(o, _)| *o <= order);
        list.insert(at, (order, item));
    }
}

pub(crate) struct Pipeline {
    state: RwLock<State>,
    queue: RwLock<Vec<Mutex<Entry>>>,
    buckets: Mutex<Buckets>,
    /// Async impacts of the current iteration, frozen after sync apply.
    deltas: RwLock<Vec<Impact>>,
    next_action: AtomicUsize,
    next_delta: AtomicUsize,
    continued: AtomicBool,
    resumed: AtomicU64,
    status: Mutex<Option<ExecutionError>>,
    metrics: Mutex<ExecutionMetrics>,
}

impl Pipeline {
    pub(crate) fn new(state: State) -> Self {
        Self {
            state: RwLock::new(state),
            queue: RwLock::new(Vec::new()),
            buckets: Mutex::new(Buckets::default()),
            deltas: RwLock::new(Vec::new()),
            next_action: AtomicUsize::new(0),
            next_delta: AtomicUsize::new(0),
            continued: AtomicBool::new(false),
            resumed: AtomicU64::new(0),
            status: Mutex::new(None),
            metrics: Mutex::new(ExecutionMetrics::default()),
        }
    }

    // ── Outside a tick ──────────────────────────────────────────

    /// Append an action, due immediately.
    pub(crate) fn push(&self, action: &Action) -> Result<(), ExecutionError> {
        let mut queue = self.queue.write()?;
        let order = queue.len();
        queue.push(Mutex::new(Entry::new(action, order)));
        Ok(())
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn state(&self) -> Result<RwLockReadGuard<'_, State>, ExecutionError> {
        Ok(self.state.read()?)
    }

    pub(crate) fn metrics(&self) -> ExecutionMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the state and drop every action, counter and error.
    pub(crate) fn reset(&self, state: State) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
        self.queue
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.clear_transient();
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) =
            ExecutionMetrics::default();
    }

    /// Forget the in-flight iteration after workers were stopped mid-tick,
    /// including cell writes that were applied but not yet committed.
    pub(crate) fn clear_transient(&self) {
        *self.buckets.lock().unwrap_or_else(PoisonError::into_inner) = Buckets::default();
        self.deltas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.next_action.store(0, Ordering::Release);
        self.next_delta.store(0, Ordering::Release);
        self.continued.store(false, Ordering::Release);
        self.resumed.store(0, Ordering::Release);
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .discard_deltas();
    }

    /// The sticky error, if any.
    pub(crate) fn check(&self) -> Result<(), ExecutionError> {
        match &*self.status.lock()? {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Record `e` unless an earlier error is already recorded.
    pub(crate) fn fail(&self, e: ExecutionError) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if status.is_none() {
            error!(error = %e, "execution failed");
            *status = Some(e);
        }
    }

    fn record(&self, result: Result<(), ExecutionError>) {
        if let Err(e) = result {
            self.fail(e);
        }
    }

    // ── One tick ────────────────────────────────────────────────

    /// Run one tick. Every party of `barrier` must call this together.
    pub(crate) fn tick(&self, barrier: &Barrier) -> Result<(), ExecutionError> {
        self.check()?;
        loop {
            self.record(self.dispatch());
            barrier.once(|| self.record(self.apply_sync()))?;
            self.check()?;

            self.record(self.apply_async());
            barrier.wait()?;
            self.check()?;

            self.record(self.adjust());
            barrier.once(|| self.record(self.end_iteration()))?;
            self.check()?;

            if !self.continued.load(Ordering::Acquire) {
                break;
            }
        }
        barrier.once(|| self.record(self.end_tick()))?;
        self.check()
    }

    fn dispatch(&self) -> Result<(), ExecutionError> {
        let state = self.state.read()?;
        let queue = self.queue.read()?;
        loop {
            let index = self.next_action.fetch_add(1, Ordering::AcqRel);
            let Some(slot) = queue.get(index) else {
                break;
            };
            let mut entry = slot.lock()?;
            if entry.finished || entry.clock > 0 {
                continue;
            }
            self.resumed.fetch_add(1, Ordering::Relaxed);
            match entry.generator.resume(&*state) {
                None => entry.finished = true,
                Some(impacts) => {
                    if !self.classify(entry.order, impacts)? {
                        entry.clock = entry.tick_duration;
                    }
                }
            }
        }
        Ok(())
    }

    /// Sort one resumption's impacts into the buckets. Returns whether the
    /// action asked to continue within this tick.
    fn classify(&self, order: usize, impacts: ImpactList) -> Result<bool, ExecutionError> {
        let mut buckets = self.buckets.lock()?;
        let mut continued = false;
        for impact in impacts {
            match impact {
                Impact::Noop => {}
                Impact::TickContinue => continued = true,
                Impact::QueueAction(action) => {
                    Buckets::insert_sorted(&mut buckets.forks, order, action)
                }
                sync if sync.is_sync() => Buckets::insert_sorted(&mut buckets.sync, order, sync),
                delta => buckets.deltas.push(delta),
            }
        }
        buckets.continued |= continued;
        Ok(continued)
    }

    fn apply_sync(&self) -> Result<(), ExecutionError> {
        self.check()?;
        let (sync, deltas) = {
            let mut buckets = self.buckets.lock()?;
            (mem::take(&mut buckets.sync), mem::take(&mut buckets.deltas))
        };
        {
            let mut state = self.state.write()?;
            for (_, impact) in &sync {
                state.apply(impact)?;
            }
        }
        self.metrics.lock()?.sync_applied += sync.len() as u64;
        *self.deltas.write()? = deltas;
        self.next_delta.store(0, Ordering::Release);
        Ok(())
    }

    fn apply_async(&self) -> Result<(), ExecutionError> {
        let state = self.state.read()?;
        let deltas = self.deltas.read()?;
        let mut applied = 0u64;
        let result = loop {
            let index = self.next_delta.fetch_add(1, Ordering::AcqRel);
            let Some(impact) = deltas.get(index) else {
                break Ok(());
            };
            if let Err(e) = state.apply_delta(impact) {
                break Err(e.into());
            }
            applied += 1;
        };
        self.metrics.lock()?.async_applied += applied;
        result
    }

    fn adjust(&self) -> Result<(), ExecutionError> {
        let state = self.state.read()?;
        while state.adjust() {}
        Ok(())
    }

    fn end_iteration(&self) -> Result<(), ExecutionError> {
        self.state.read()?.adjust_done();
        self.deltas.write()?.clear();

        let (forks, continued) = {
            let mut buckets = self.buckets.lock()?;
            (
                mem::take(&mut buckets.forks),
                mem::take(&mut buckets.continued),
            )
        };
        let forked = forks.len();
        if forked > 0 {
            let mut queue = self.queue.write()?;
            let base = queue.len();
            for (i, (_, action)) in forks.into_iter().enumerate() {
                queue.push(Mutex::new(Entry::new(&action, base + i)));
            }
        }
        {
            let mut metrics = self.metrics.lock()?;
            metrics.iterations += 1;
            metrics.forks += forked as u64;
        }

        self.next_action.store(0, Ordering::Release);
        self.continued.store(continued, Ordering::Release);
        trace!(continued, forked, "iteration finished");
        Ok(())
    }

    fn end_tick(&self) -> Result<(), ExecutionError> {
        let mut queue = self.queue.write()?;
        let before = queue.len();
        queue.retain_mut(|slot| {
            !slot
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .finished
        });
        for (order, slot) in queue.iter_mut().enumerate() {
            let entry = slot.get_mut().unwrap_or_else(PoisonError::into_inner);
            entry.order = order;
            entry.clock = (entry.clock - 1).max(0);
        }
        let finished = before - queue.len();
        drop(queue);

        let mut metrics = self.metrics.lock()?;
        metrics.ticks += 1;
        metrics.actions_finished += finished as u64;
        metrics.actions_resumed += self.resumed.swap(0, Ordering::AcqRel);
        self.next_action.store(0, Ordering::Release);
        trace!(tick = metrics.ticks, finished, "tick finished");
        Ok(())
    }
}

// Compile-time assertion: the pipeline is shared by every worker.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Pipeline>();
};
