//! Generational block buffers for Chronon simulations.
//!
//! A [`Buffer`] stores fixed-width integer cells in blocks addressed by
//! generation-tagged [`Handle`](chronon_core::Handle)s. Structural changes
//! (allocate, reallocate, free) need exclusive access; cell writes and the
//! chunked commit work through shared references so that tick workers can
//! run them in parallel.
//!
//! # Architecture
//!
//! ```text
//! Buffer<T>
//! ├── blocks: id → (offset, generation, size)
//! ├── RunMap: per-cell free/occupied run lengths (first-fit, merge on free)
//! └── cells: (value, delta) atomics
//! ```
//!
//! Writes only touch deltas. [`Buffer::adjust_chunk`] folds deltas into
//! values chunk by chunk; reads see values only.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
mod runs;
pub mod scalar;

pub use buffer::Buffer;
pub use config::BufferConfig;
pub use scalar::Scalar;
