//! Reusable action fixtures.
//!
//! - [`scripted`]: yields a fixed list of impact lists, then finishes.
//! - [`ticker`]: adds a delta to one cell on every resumption, forever.
//! - [`forking`]: queues a child action, then finishes.
//! - [`probe`]: reports the committed value of one cell over a channel on
//!   every resumption, from whichever thread resumed it.
//!
//! The impact helpers ([`alloc_into`], [`set`], [`add`]) address cell 0..n
//! of integer blocks by id, assuming generation 0.

use crossbeam_channel::Sender;
use smallvec::smallvec;

use chronon_core::{Access, Action, Handle, Impact, ImpactList, Integer, Time};

/// Allocate a fresh integer block of `size` cells under `id`.
pub fn alloc_into(id: i64, size: usize) -> Impact {
    Impact::IntegerAllocateInto {
        handle: Handle::unused(id),
        size,
    }
}

/// Set cell `index` of block `id`.
pub fn set(id: i64, index: usize, value: Integer) -> Impact {
    Impact::IntegerSet {
        handle: Handle::new(id, 0),
        index,
        value,
    }
}

/// Add to cell `index` of block `id`.
pub fn add(id: i64, index: usize, delta: Integer) -> Impact {
    Impact::IntegerAdd {
        handle: Handle::new(id, 0),
        index,
        delta,
    }
}

/// An action yielding `steps` in order and then finishing.
pub fn scripted(steps: Vec<ImpactList>) -> Action {
    Action::from_fn(move |_| {
        let mut steps = steps.clone().into_iter();
        move |_: &dyn Access| steps.next()
    })
}

/// An action adding `delta` to `handle[index]` every `period` ticks.
pub fn ticker(handle: Handle, index: usize, delta: Integer, period: Time) -> Action {
    Action::from_fn(move |_| {
        move |_: &dyn Access| -> Option<ImpactList> {
            Some(smallvec![Impact::IntegerAdd {
                handle,
                index,
                delta
            }])
        }
    })
    .set_tick_duration(period)
}

/// An action that queues `child` on its first resumption.
pub fn forking(child: Action) -> Action {
    Action::from_fn(move |_| {
        let mut child = Some(child.clone());
        move |_: &dyn Access| child.take().map(|c| -> ImpactList { smallvec![c.into()] })
    })
}

/// What a [`probe`] saw on one resumption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Resumption number, starting at 0.
    pub step: usize,
    /// Committed value of the probed cell, or `default`.
    pub value: Integer,
    /// Name of the resuming thread, if it has one.
    pub thread: Option<String>,
}

/// An action that reports `handle[index]` (or `default`) over `tx` on each
/// of its first `steps` resumptions.
pub fn probe(
    handle: Handle,
    index: usize,
    default: Integer,
    steps: usize,
    tx: Sender<Observation>,
) -> Action {
    Action::from_fn(move |_| {
        let tx = tx.clone();
        let mut step = 0;
        move |access: &dyn Access| -> Option<ImpactList> {
            if step == steps {
                return None;
            }
            let observation = Observation {
                step,
                value: access.get_integer(handle, index, default),
                thread: std::thread::current().name().map(str::to_owned),
            };
            // The receiver may be gone when a test only cares about effects.
            let _ = tx.send(observation);
            step += 1;
            Some(ImpactList::new())
        }
    })
}
