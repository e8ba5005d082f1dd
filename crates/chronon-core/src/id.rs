//! Strongly-typed identifiers, the [`Handle`] type, and scalar aliases.

use std::fmt;

/// Integer cell type stored in the integer buffer.
pub type Integer = i64;

/// Byte cell type stored in the byte buffer.
pub type Byte = i8;

/// Discrete simulation time, measured in ticks.
pub type Time = i64;

/// Id value meaning "no allocation".
pub const ID_UNDEFINED: i64 = -1;

/// Identifies one allocation inside a buffer.
///
/// A handle is valid only while `generation` equals the buffer's stored
/// generation for `id`. Freeing and reusing an id bumps the stored
/// generation, so a stale handle fails every access instead of aliasing
/// the new block.
///
/// Ids and generations are plain integers so that handles can round-trip
/// through integer cells (see `Impact::IntegerAllocate`). A generation of
/// `-1` names an id that has never been allocated; the first handle issued
/// for any id has generation `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    /// Block id.
    pub id: i64,
    /// Allocation generation of the block.
    pub generation: i64,
}

impl Handle {
    /// A handle that refers to nothing.
    pub const NULL: Handle = Handle {
        id: ID_UNDEFINED,
        generation: -1,
    };

    /// Create a handle from an id and generation.
    pub const fn new(id: i64, generation: i64) -> Self {
        Self { id, generation }
    }

    /// A handle for an id that has never been allocated.
    ///
    /// This is the form `allocate_into` expects for a fresh id.
    pub const fn unused(id: i64) -> Self {
        Self { id, generation: -1 }
    }

    /// The handle the next allocation into this id will produce.
    pub const fn next_generation(self) -> Self {
        Self {
            id: self.id,
            generation: self.generation + 1,
        }
    }

    /// Whether this is [`Handle::NULL`] or any other negative id.
    pub const fn is_null(&self) -> bool {
        self.id < 0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(id={}, gen={})", self.id, self.generation)
    }
}

/// Identifies a named value inside an entity or layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FieldId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
