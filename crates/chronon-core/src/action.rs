//! Suspendable computations that produce impacts over time.
//!
//! An [`Action`] is an immutable recipe: a tick duration, a "self" handle,
//! and a factory that builds a fresh [`Generator`] each time the action is
//! queued. The generator is the running instance. Each
//! [`resume`](Generator::resume) call returns the impacts for one tick, or
//! `None` once the computation has finished.
//!
//! ```text
//! Created ──resume──► Running ──Some(impacts)──► Suspended ──resume──► …
//!                        │
//!                        └──None──► Finished
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::ActionError;
use crate::id::{Handle, Time};
use crate::impact::ImpactList;
use crate::traits::Access;

/// A running action.
///
/// One `resume` call returns exactly the impacts the action produces before
/// its next suspension point. Returning `None` finishes the generator; it is
/// not resumed again.
pub trait Generator: Send {
    /// Advance to the next suspension point.
    fn resume(&mut self, access: &dyn Access) -> Option<ImpactList>;
}

impl<F> Generator for F
where
    F: FnMut(&dyn Access) -> Option<ImpactList> + Send,
{
    fn resume(&mut self, access: &dyn Access) -> Option<ImpactList> {
        self(access)
    }
}

/// Position of a [`StepGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Not resumed yet.
    Init,
    /// Suspended before the given step.
    Awaiting(usize),
    /// Finished.
    Done,
}

/// Generator written as an explicit state machine.
///
/// The step function receives the step number (starting at 0) and returns
/// the impacts for that step, or `None` to finish.
///
/// ```
/// use chronon_core::{Access, Action, Handle, Impact, Progress, StepGenerator};
/// use smallvec::smallvec;
///
/// let cell = Handle::new(0, 0);
/// let action = Action::from_fn(move |_| {
///     StepGenerator::new(move |step, _access: &dyn Access| match step {
///         0 => Some(smallvec![Impact::IntegerSet { handle: cell, index: 0, value: 1 }]),
///         1 => Some(smallvec![Impact::IntegerAdd { handle: cell, index: 0, delta: 1 }]),
///         _ => None,
///     })
/// });
/// assert!(action.has_generator());
///
/// let idle = StepGenerator::new(|_, _: &dyn Access| None);
/// assert_eq!(idle.progress(), Progress::Init);
/// ```
pub struct StepGenerator<F> {
    progress: Progress,
    step: F,
}

impl<F> StepGenerator<F>
where
    F: FnMut(usize, &dyn Access) -> Option<ImpactList> + Send,
{
    /// Create a generator in the [`Progress::Init`] state.
    pub fn new(step: F) -> Self {
        Self {
            progress: Progress::Init,
            step,
        }
    }

    /// Current position.
    pub fn progress(&self) -> Progress {
        self.progress
    }
}

impl<F> Generator for StepGenerator<F>
where
    F: FnMut(usize, &dyn Access) -> Option<ImpactList> + Send,
{
    fn resume(&mut self, access: &dyn Access) -> Option<ImpactList> {
        let step = match self.progress {
            Progress::Init => 0,
            Progress::Awaiting(n) => n,
            Progress::Done => return None,
        };
        match (self.step)(step, access) {
            Some(impacts) => {
                self.progress = Progress::Awaiting(step + 1);
                Some(impacts)
            }
            None => {
                self.progress = Progress::Done;
                None
            }
        }
    }
}

/// Generator that finishes on its first resume.
struct Finished;

impl Generator for Finished {
    fn resume(&mut self, _access: &dyn Access) -> Option<ImpactList> {
        None
    }
}

type Factory = Arc<dyn Fn(Handle) -> Box<dyn Generator> + Send + Sync>;

/// A resumable unit of simulation logic.
///
/// Actions are values: [`setup`](Action::setup),
/// [`set_tick_duration`](Action::set_tick_duration) and
/// [`set_self`](Action::set_self) return modified copies. Once an action is
/// in an error state these calls return it unchanged, and
/// [`run`](Action::run) yields a generator that finishes immediately.
///
/// Cloning is cheap: the factory is shared. Because the controller may
/// replay an action long after it was created, the factory must capture
/// everything it needs by value.
#[derive(Clone)]
pub struct Action {
    tick_duration: Time,
    factory: Option<Factory>,
    self_handle: Handle,
    error: Option<ActionError>,
}

impl Action {
    /// Ticks between two resumptions unless the action asks to continue.
    pub const DEFAULT_TICK_DURATION: Time = 10;

    /// An action with no generator and the default tick duration.
    pub fn new() -> Self {
        Self {
            tick_duration: Self::DEFAULT_TICK_DURATION,
            factory: None,
            self_handle: Handle::NULL,
            error: None,
        }
    }

    /// Shorthand for `Action::new().setup(factory)`.
    pub fn from_fn<F, G>(factory: F) -> Self
    where
        F: Fn(Handle) -> G + Send + Sync + 'static,
        G: Generator + 'static,
    {
        Self::new().setup(factory)
    }

    /// Replace the generator factory.
    ///
    /// The factory receives the action's self handle each time the action
    /// is started.
    pub fn setup<F, G>(&self, factory: F) -> Self
    where
        F: Fn(Handle) -> G + Send + Sync + 'static,
        G: Generator + 'static,
    {
        if self.is_error() {
            return self.clone();
        }
        let factory: Factory =
            Arc::new(move |handle: Handle| -> Box<dyn Generator> { Box::new(factory(handle)) });
        Self {
            factory: Some(factory),
            ..self.clone()
        }
    }

    /// Replace the tick duration. A non-positive duration puts the action
    /// into the error state.
    pub fn set_tick_duration(&self, duration: Time) -> Self {
        if self.is_error() {
            return self.clone();
        }
        if duration <= 0 {
            return Self {
                error: Some(ActionError::InvalidTickDuration { value: duration }),
                ..self.clone()
            };
        }
        Self {
            tick_duration: duration,
            ..self.clone()
        }
    }

    /// Replace the self handle passed to the factory.
    pub fn set_self(&self, handle: Handle) -> Self {
        if self.is_error() {
            return self.clone();
        }
        Self {
            self_handle: handle,
            ..self.clone()
        }
    }

    /// Ticks between resumptions.
    pub fn tick_duration(&self) -> Time {
        self.tick_duration
    }

    /// Handle passed to the factory.
    pub fn self_handle(&self) -> Handle {
        self.self_handle
    }

    /// The sticky error, if any.
    pub fn error(&self) -> Option<ActionError> {
        self.error
    }

    /// Whether the action is in the error state.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether a generator factory has been set.
    pub fn has_generator(&self) -> bool {
        self.factory.is_some()
    }

    /// Start a new generator for this action.
    pub fn run(&self) -> Box<dyn Generator> {
        match (&self.factory, self.error) {
            (Some(factory), None) => factory(self.self_handle),
            _ => Box::new(Finished),
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("tick_duration", &self.tick_duration)
            .field("self_handle", &self.self_handle)
            .field("has_generator", &self.factory.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        let same_factory = match (&self.factory, &other.factory) {
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (None, None) => true,
            _ => false,
        };
        same_factory
            && self.tick_duration == other.tick_duration
            && self.self_handle == other.self_handle
            && self.error == other.error
    }
}

// Compile-time assertion: actions travel between worker threads inside
// impact lists.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Action>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BufferError;
    use crate::id::{Byte, Integer};
    use crate::impact::Impact;
    use smallvec::smallvec;

    struct Empty;

    impl Access for Empty {
        fn integers_size(&self, _: Handle) -> usize {
            0
        }
        fn bytes_size(&self, _: Handle) -> usize {
            0
        }
        fn read_integers(&self, h: Handle, _: usize, _: &mut [Integer]) -> Result<(), BufferError> {
            Err(BufferError::InvalidHandleId { id: h.id })
        }
        fn read_bytes(&self, h: Handle, _: usize, _: &mut [Byte]) -> Result<(), BufferError> {
            Err(BufferError::InvalidHandleId { id: h.id })
        }
        fn get_integer(&self, _: Handle, _: usize, default: Integer) -> Integer {
            default
        }
        fn get_byte(&self, _: Handle, _: usize, default: Byte) -> Byte {
            default
        }
    }

    fn two_steps(self_handle: Handle) -> impl Generator {
        StepGenerator::new(move |step, _access: &dyn Access| match step {
            0 => Some(smallvec![Impact::IntegerAdd {
                handle: self_handle,
                index: 0,
                delta: 1
            }]),
            1 => Some(smallvec![Impact::Noop, Impact::Noop]),
            _ => None,
        })
    }

    #[test]
    fn default_action_finishes_immediately() {
        let action = Action::new();
        assert_eq!(action.tick_duration(), Action::DEFAULT_TICK_DURATION);
        assert!(!action.has_generator());
        assert!(action.run().resume(&Empty).is_none());
    }

    #[test]
    fn generator_yields_then_finishes() {
        let mut gen = Action::from_fn(two_steps).run();
        assert_eq!(gen.resume(&Empty).map(|l| l.len()), Some(1));
        assert_eq!(gen.resume(&Empty).map(|l| l.len()), Some(2));
        assert!(gen.resume(&Empty).is_none());
        assert!(gen.resume(&Empty).is_none());
    }

    #[test]
    fn factory_receives_self_handle() {
        let action = Action::from_fn(two_steps).set_self(Handle::new(5, 2));
        let first = action.run().resume(&Empty);
        assert_eq!(
            first.as_deref(),
            Some(
                &[Impact::IntegerAdd {
                    handle: Handle::new(5, 2),
                    index: 0,
                    delta: 1
                }][..]
            )
        );
    }

    #[test]
    fn invalid_tick_duration_is_sticky() {
        let action = Action::from_fn(two_steps).set_tick_duration(0);
        assert_eq!(
            action.error(),
            Some(ActionError::InvalidTickDuration { value: 0 })
        );
        let again = action.set_tick_duration(5).set_self(Handle::new(1, 0));
        assert!(again.is_error());
        assert_eq!(again.tick_duration(), Action::DEFAULT_TICK_DURATION);
        assert_eq!(again.self_handle(), Handle::NULL);
        assert!(again.run().resume(&Empty).is_none());
    }

    #[test]
    fn setters_return_copies() {
        let base = Action::new();
        let fast = base.set_tick_duration(1);
        assert_eq!(base.tick_duration(), Action::DEFAULT_TICK_DURATION);
        assert_eq!(fast.tick_duration(), 1);
    }

    #[test]
    fn closures_are_generators() {
        let mut calls = 0;
        let mut gen = move |_access: &dyn Access| {
            calls += 1;
            (calls < 3).then(ImpactList::new)
        };
        assert!(gen.resume(&Empty).is_some());
        assert!(gen.resume(&Empty).is_some());
        assert!(gen.resume(&Empty).is_none());
    }

    #[test]
    fn step_generator_tracks_progress() {
        let mut gen = StepGenerator::new(|step, _access: &dyn Access| {
            (step == 0).then(ImpactList::new)
        });
        assert_eq!(gen.progress(), Progress::Init);
        gen.resume(&Empty);
        assert_eq!(gen.progress(), Progress::Awaiting(1));
        gen.resume(&Empty);
        assert_eq!(gen.progress(), Progress::Done);
    }

    #[test]
    fn clones_compare_equal() {
        let a = Action::from_fn(two_steps);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Action::from_fn(two_steps));
    }
}
