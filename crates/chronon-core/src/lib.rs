//! Core types and traits for the Chronon simulation kernel.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary every other crate speaks: generation-tagged [`Handle`]s, the
//! [`Impact`] mutation requests, the [`Access`]/[`ReadWrite`] state traits,
//! suspendable [`Action`]s, and the [`Entity`]/[`Layout`] helpers that
//! gameplay code uses to address cells by name.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod entity;
pub mod error;
pub mod id;
pub mod impact;
pub mod layout;
pub mod traits;

pub use action::{Action, Generator, Progress, StepGenerator};
pub use entity::{Entity, ValuePoint};
pub use error::{ActionError, ApplyError, BufferError};
pub use id::{Byte, FieldId, Handle, Integer, Time, ID_UNDEFINED};
pub use impact::{Impact, ImpactList, ImpactMode};
pub use layout::Layout;
pub use traits::{Access, ReadWrite};
