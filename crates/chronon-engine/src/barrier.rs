//! Reusable rendezvous for tick workers.
//!
//! Every phase boundary of a tick is a [`Barrier`] wait. Phases that must
//! run on one thread use [`Barrier::once`]: all parties fence in, the last
//! one to arrive runs the closure, and all parties fence out. The second
//! fence keeps a fast worker from entering the next phase while a slow one
//! is still leaving the previous one.
//!
//! A barrier with one party never blocks, which lets the inline
//! (zero-worker) execution path run the same tick code as the threaded one.

use std::error::Error;
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};

/// Why a barrier wait did not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierError {
    /// [`Barrier::cancel`] was called.
    Cancelled,
    /// The internal lock was poisoned.
    Poisoned,
}

impl fmt::Display for BarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "barrier cancelled"),
            Self::Poisoned => write!(f, "barrier lock poisoned"),
        }
    }
}

impl Error for BarrierError {}

impl<T> From<PoisonError<T>> for BarrierError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

struct Inner {
    arrived: usize,
    generation: u64,
    cancelled: bool,
}

/// Counting barrier for a fixed number of parties.
pub struct Barrier {
    parties: usize,
    inner: Mutex<Inner>,
    cvar: Condvar,
}

impl Barrier {
    /// A barrier for `parties` threads. Zero is treated as one.
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            inner: Mutex::new(Inner {
                arrived: 0,
                generation: 0,
                cancelled: false,
            }),
            cvar: Condvar::new(),
        }
    }

    /// Number of parties.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until every party has arrived.
    ///
    /// Returns `Ok(true)` on exactly one thread per round, the last to
    /// arrive.
    pub fn wait(&self) -> Result<bool, BarrierError> {
        let mut inner = self.inner.lock()?;
        if inner.cancelled {
            return Err(BarrierError::Cancelled);
        }
        let generation = inner.generation;
        inner.arrived += 1;
        if inner.arrived == self.parties {
            inner.arrived = 0;
            inner.generation = inner.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(true);
        }
        while inner.generation == generation && !inner.cancelled {
            inner = self.cvar.wait(inner)?;
        }
        if inner.generation == generation {
            return Err(BarrierError::Cancelled);
        }
        Ok(false)
    }

    /// Fence in, run `f` on the leader, fence out.
    ///
    /// The leader gets `Some(f())`; every other party gets `None` after the
    /// leader has finished.
    pub fn once<R>(&self, f: impl FnOnce() -> R) -> Result<Option<R>, BarrierError> {
        let out = if self.wait()? { Some(f()) } else { None };
        self.wait()?;
        Ok(out)
    }

    /// Release every current and future waiter with
    /// [`BarrierError::Cancelled`].
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.cancelled = true;
        self.cvar.notify_all();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancelled
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("parties", &self.parties)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn single_party_never_blocks() {
        let barrier = Barrier::new(1);
        assert_eq!(barrier.wait(), Ok(true));
        assert_eq!(barrier.once(|| 7), Ok(Some(7)));
        assert_eq!(Barrier::new(0).parties(), 1);
    }

    #[test]
    fn exactly_one_leader_per_round() {
        let barrier = Barrier::new(4);
        let leaders = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        if barrier.wait().unwrap() {
                            leaders.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        assert_eq!(leaders.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn once_runs_before_anyone_leaves() {
        let barrier = Barrier::new(3);
        let counter = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    for round in 1..=50 {
                        barrier
                            .once(|| counter.fetch_add(1, Ordering::Relaxed))
                            .unwrap();
                        assert_eq!(counter.load(Ordering::Relaxed), round);
                    }
                });
            }
        });
    }

    #[test]
    fn cancel_releases_waiters() {
        let barrier = Barrier::new(3);
        thread::scope(|s| {
            let waiter = s.spawn(|| barrier.wait());
            while barrier.inner.lock().unwrap().arrived == 0 {
                thread::yield_now();
            }
            barrier.cancel();
            assert_eq!(waiter.join().unwrap(), Err(BarrierError::Cancelled));
        });
        assert!(barrier.is_cancelled());
        assert_eq!(barrier.wait(), Err(BarrierError::Cancelled));
    }
}
