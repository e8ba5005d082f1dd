//! Simulation state for the Chronon kernel.
//!
//! A [`State`] owns one integer [`Buffer`](chronon_arena::Buffer), one
//! byte buffer, and a seeded [`Mt64`] generator. It implements
//! [`ReadWrite`](chronon_core::ReadWrite): every [`Impact`](chronon_core::Impact)
//! except the scheduler's control impacts can be applied to it, and all
//! cell writes become visible only after an adjust.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod rng;
pub mod state;

pub use config::StateConfig;
pub use rng::Mt64;
pub use state::State;
