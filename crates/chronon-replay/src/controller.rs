//! Time-ordered event log driving an [`Execution`].

use chronon_core::{Action, Time};
use chronon_engine::{Execution, ExecutionError};
use chronon_state::State;
use tracing::{debug, trace, warn};

use crate::error::ControllerError;

/// An action scheduled to start at a fixed time.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Tick at which the action is queued into the execution.
    pub time: Time,
    /// The action to queue.
    pub action: Action,
}

impl Event {
    /// An event queueing `action` at `time`.
    pub fn new(time: Time, action: Action) -> Self {
        Self { time, action }
    }
}

/// Append-only event history plus a playback position.
///
/// The controller is the only thing that advances its execution's time:
/// [`schedule`](Self::schedule) never steps past a due event, and
/// [`rewind`](Self::rewind) resets the execution to a baseline state and
/// replays the history from time zero. Rewinding is therefore exact only
/// because execution is deterministic.
#[derive(Debug, Default)]
pub struct Controller {
    history: Vec<Event>,
    time: Time,
    index: usize,
    baseline: Option<State>,
}

impl Controller {
    /// An empty controller without rewind support.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty controller with room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Enable rewinding into the past by resetting to a clone of `state`.
    ///
    /// `state` should be the state the execution started from.
    pub fn with_baseline(mut self, state: State) -> Self {
        self.baseline = Some(state);
        self
    }

    /// Events in time order. Equal times keep queue order.
    pub fn history(&self) -> &[Event] {
        &self.history
    }

    /// Current playback time.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Number of history events already queued into the execution.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Insert `event` into the history.
    ///
    /// Events at the current time are still accepted and run on the next
    /// [`schedule`](Self::schedule) call.
    pub fn queue(&mut self, event: Event) -> Result<(), ControllerError> {
        if event.time < self.time {
            warn!(time = event.time, current = self.time, "event rejected");
            return Err(ControllerError::InvalidEventTime {
                time: event.time,
                current: self.time,
            });
        }
        let at = self.history.partition_point(|e| e.time <= event.time);
        self.history.insert(at, event);
        Ok(())
    }

    /// Advance `execution` by `elapsed` ticks, queueing each due event's
    /// action at its time.
    ///
    /// With a threaded execution this returns once the ticks are handed
    /// over; call [`Execution::join`] or use
    /// [`schedule_and_join`](Self::schedule_and_join) to wait for them.
    pub fn schedule(
        &mut self,
        execution: &Execution,
        elapsed: Time,
    ) -> Result<(), ControllerError> {
        if elapsed < 0 {
            return Err(ExecutionError::InvalidTime { time: elapsed }.into());
        }
        let end = self.time.saturating_add(elapsed);
        while let Some(event) = self.history.get(self.index) {
            if event.time >= end {
                break;
            }
            if event.time > self.time {
                execution.schedule(event.time - self.time)?;
                self.time = event.time;
            }
            execution.queue(event.action.clone())?;
            self.index += 1;
            trace!(time = self.time, index = self.index, "event queued");
        }
        execution.schedule(end - self.time)?;
        self.time = end;
        Ok(())
    }

    /// [`schedule`](Self::schedule) then wait for every tick to run.
    pub fn schedule_and_join(
        &mut self,
        execution: &Execution,
        elapsed: Time,
    ) -> Result<(), ControllerError> {
        self.schedule(execution, elapsed)?;
        execution.join()?;
        Ok(())
    }

    /// Move playback to `time`.
    ///
    /// A target at or after the current time just advances. An earlier
    /// target resets `execution` to the baseline and replays the history
    /// from zero, which fails with [`ControllerError::Unsupported`] when no
    /// baseline was given. The call returns once the target is reached.
    pub fn rewind(
        &mut self,
        execution: &mut Execution,
        time: Time,
    ) -> Result<(), ControllerError> {
        if time < 0 {
            warn!(time, "rewind rejected");
            return Err(ControllerError::InvalidRewindTime { time });
        }
        if time >= self.time {
            return self.schedule_and_join(execution, time - self.time);
        }
        let baseline = self.baseline.as_ref().ok_or(ControllerError::Unsupported)?;
        debug!(from = self.time, to = time, "controller rewind");
        execution.reset(baseline.clone())?;
        self.time = 0;
        self.index = 0;
        self.schedule_and_join(execution, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(duration: Time) -> Action {
        Action::new().set_tick_duration(duration)
    }

    #[test]
    fn queue_keeps_time_order_and_ties_in_order() {
        let mut ctrl = Controller::new();
        ctrl.queue(Event::new(5, marked(1))).unwrap();
        ctrl.queue(Event::new(2, marked(2))).unwrap();
        ctrl.queue(Event::new(5, marked(3))).unwrap();
        ctrl.queue(Event::new(0, marked(4))).unwrap();
        let order: Vec<_> = ctrl
            .history()
            .iter()
            .map(|e| (e.time, e.action.tick_duration()))
            .collect();
        assert_eq!(order, vec![(0, 4), (2, 2), (5, 1), (5, 3)]);
    }

    #[test]
    fn past_events_are_rejected() {
        let exe = Execution::new(State::seeded(0));
        let mut ctrl = Controller::new();
        ctrl.schedule(&exe, 3).unwrap();
        assert_eq!(
            ctrl.queue(Event::new(2, Action::new())),
            Err(ControllerError::InvalidEventTime {
                time: 2,
                current: 3
            })
        );
        assert!(ctrl.history().is_empty());
        ctrl.queue(Event::new(3, Action::new())).unwrap();
    }

    #[test]
    fn schedule_stops_at_event_boundaries() {
        let exe = Execution::new(State::seeded(0));
        let mut ctrl = Controller::new();
        ctrl.queue(Event::new(2, Action::new())).unwrap();
        ctrl.queue(Event::new(4, Action::new())).unwrap();
        ctrl.schedule(&exe, 3).unwrap();
        assert_eq!((ctrl.time(), ctrl.index()), (3, 1));
        assert_eq!(exe.metrics().ticks, 3);
        ctrl.schedule(&exe, 1).unwrap();
        assert_eq!((ctrl.time(), ctrl.index()), (4, 1));
        ctrl.schedule(&exe, 1).unwrap();
        assert_eq!((ctrl.time(), ctrl.index()), (5, 2));
    }

    #[test]
    fn rewind_rejects_negative_time() {
        let mut exe = Execution::new(State::seeded(0));
        let mut ctrl = Controller::new();
        assert_eq!(
            ctrl.rewind(&mut exe, -1),
            Err(ControllerError::InvalidRewindTime { time: -1 })
        );
    }

    #[test]
    fn rewind_forward_advances() {
        let mut exe = Execution::new(State::seeded(0));
        let mut ctrl = Controller::new();
        ctrl.rewind(&mut exe, 4).unwrap();
        assert_eq!(ctrl.time(), 4);
        assert_eq!(exe.metrics().ticks, 4);
    }

    #[test]
    fn rewind_backwards_needs_baseline() {
        let mut exe = Execution::new(State::seeded(0));
        let mut ctrl = Controller::new();
        ctrl.schedule_and_join(&exe, 4).unwrap();
        assert_eq!(ctrl.rewind(&mut exe, 2), Err(ControllerError::Unsupported));
        assert_eq!(ctrl.time(), 4);

        let mut ctrl = Controller::new().with_baseline(State::seeded(0));
        ctrl.schedule_and_join(&exe, 4).unwrap();
        ctrl.rewind(&mut exe, 2).unwrap();
        assert_eq!((ctrl.time(), ctrl.index()), (2, 0));
        assert_eq!(exe.metrics().ticks, 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn history_is_sorted_and_ties_keep_queue_order(times in prop::collection::vec(0i64..20, 0..48)) {
                let mut ctrl = Controller::new();
                for (seq, &time) in times.iter().enumerate() {
                    ctrl.queue(Event::new(time, marked(seq as Time + 1))).unwrap();
                }
                let got: Vec<(Time, Time)> = ctrl
                    .history()
                    .iter()
                    .map(|e| (e.time, e.action.tick_duration()))
                    .collect();
                let mut expected: Vec<(Time, Time)> = times
                    .iter()
                    .enumerate()
                    .map(|(seq, &t)| (t, seq as Time + 1))
                    .collect();
                expected.sort_by_key(|&(t, _)| t);
                prop_assert_eq!(got, expected);
            }
        }
    }
}
