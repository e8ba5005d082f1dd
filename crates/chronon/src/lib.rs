//! Chronon: a deterministic multi-threaded simulation kernel.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Chronon sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use chronon::prelude::*;
//!
//! let hp = FieldId(0);
//! let hero = Entity::new().setup([hp]);
//!
//! let spawn = {
//!     let hero = hero.clone();
//!     Action::from_fn(move |_| {
//!         let hero = hero.clone();
//!         let mut done = false;
//!         move |_: &dyn Access| -> Option<ImpactList> {
//!             if done {
//!                 return None;
//!             }
//!             done = true;
//!             let alive = hero.set_handle(Handle::new(0, 0));
//!             Some(ImpactList::from_iter([
//!                 hero.set_handle(Handle::unused(0)).spawn(),
//!                 alive.set(hp, 100),
//!             ]))
//!         }
//!     })
//! };
//!
//! let exe = Execution::new(State::seeded(7));
//! let mut ctrl = Controller::new().with_baseline(State::seeded(7));
//! ctrl.queue(Event::new(0, spawn)).unwrap();
//! ctrl.schedule_and_join(&exe, 1).unwrap();
//!
//! let hero = hero.set_handle(Handle::new(0, 0));
//! assert_eq!(hero.get(&*exe.read().unwrap(), hp, -1), 100);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `chronon-core` | Handles, impacts, actions, entities, core traits |
//! | [`arena`] | `chronon-arena` | Generational block buffers |
//! | [`state`] | `chronon-state` | Simulation state and its RNG |
//! | [`engine`] | `chronon-engine` | Tick scheduler, inline and threaded |
//! | [`replay`] | `chronon-replay` | Event controller, rewind and state hashing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`chronon-core`).
///
/// Contains handles, the impact vocabulary, actions and generators,
/// entities and layouts, and the [`types::Access`] and
/// [`types::ReadWrite`] traits.
pub use chronon_core as types;

/// Generational block buffers (`chronon-arena`).
pub use chronon_arena as arena;

/// Simulation state (`chronon-state`).
pub use chronon_state as state;

/// Tick scheduler (`chronon-engine`).
///
/// [`engine::Execution`] runs queued actions inline or on a worker pool.
pub use chronon_engine as engine;

/// Event log and rewind (`chronon-replay`).
///
/// [`replay::Controller`] drives an execution from a time-ordered history
/// and rewinds by replay; [`replay::state_hash`] compares results.
pub use chronon_replay as replay;

/// Common imports for typical Chronon usage.
///
/// ```rust
/// use chronon::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use chronon_core::{
        Access, Action, Entity, FieldId, Generator, Handle, Impact, ImpactList, Layout,
        ReadWrite, Time, ValuePoint,
    };

    // Errors
    pub use chronon_core::{ActionError, ApplyError, BufferError};
    pub use chronon_engine::ExecutionError;
    pub use chronon_replay::ControllerError;

    // State
    pub use chronon_state::{State, StateConfig};

    // Engine
    pub use chronon_engine::{Execution, ExecutionConfig, ExecutionMetrics};

    // Replay
    pub use chronon_replay::{state_hash, Controller, Event};
}
