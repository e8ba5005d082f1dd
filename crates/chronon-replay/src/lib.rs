//! Event log and rewind-by-replay for Chronon simulations.
//!
//! A [`Controller`] holds a time-sorted history of [`Event`]s and drives an
//! [`Execution`](chronon_engine::Execution) forward, queueing every event's
//! action at its time. Rewinding resets the execution to a baseline state
//! and replays the history; [`state_hash`] checks that a replay reproduced
//! the same committed state.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod hash;

pub use controller::{Controller, Event};
pub use error::ControllerError;
pub use hash::state_hash;
