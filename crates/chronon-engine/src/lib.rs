//! Tick scheduler for Chronon simulations.
//!
//! An [`Execution`] owns a [`State`](chronon_state::State) and a queue of
//! [`Action`](chronon_core::Action)s, and advances them one tick at a time,
//! either on the calling thread or on a pool of workers. The result is the
//! same state for any worker count.
//!
//! # Tick pipeline
//!
//! ```text
//! loop {
//!     dispatch      resume due generators (parallel), sort impacts
//!     apply_sync    structural impacts in queue order (one thread)
//!     apply_async   cell writes (parallel)
//!     adjust        commit deltas chunk by chunk (parallel)
//!     end_iteration forks joined, repeat if anyone asked to continue
//! }
//! end_tick          drop finished actions, count clocks down
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod barrier;
pub mod config;
pub mod error;
pub mod execution;
pub mod metrics;
mod pipeline;
mod worker;

pub use barrier::{Barrier, BarrierError};
pub use config::ExecutionConfig;
pub use error::ExecutionError;
pub use execution::Execution;
pub use metrics::ExecutionMetrics;
