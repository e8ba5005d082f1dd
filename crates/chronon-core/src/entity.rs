//! Typed views over integer blocks.
//!
//! An [`Entity`] names the cells of one integer block by [`FieldId`] and
//! builds impacts against them. Field ids are kept sorted, so the cell
//! index of a field is its rank among the entity's field ids.
//!
//! Like [`Action`](crate::action::Action), an entity is a value with a
//! sticky error state. Impact builders on an errored entity, or for an
//! unknown field, return [`Impact::Noop`].

use indexmap::IndexSet;

use crate::id::{FieldId, Handle, Integer};
use crate::impact::Impact;
use crate::traits::Access;

/// A single integer cell addressed by block and index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValuePoint {
    /// Block holding the cell.
    pub handle: Handle,
    /// Cell index within the block.
    pub index: usize,
}

/// Typed view over one integer block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entity {
    handle: Handle,
    fields: IndexSet<FieldId>,
    error: bool,
}

impl Entity {
    /// An entity with no fields and a null handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `fields` into the field set.
    ///
    /// Ids already present are kept. A repeated id within `fields` puts the
    /// entity into the error state.
    pub fn setup(&self, fields: impl IntoIterator<Item = FieldId>) -> Self {
        if self.error {
            return self.clone();
        }
        let mut seen = IndexSet::new();
        for field in fields {
            if !seen.insert(field) {
                return self.errored();
            }
        }
        let mut merged = self.fields.clone();
        merged.extend(seen);
        merged.sort();
        Self {
            fields: merged,
            ..self.clone()
        }
    }

    /// Replace the block handle.
    pub fn set_handle(&self, handle: Handle) -> Self {
        if self.error {
            return self.clone();
        }
        Self {
            handle,
            ..self.clone()
        }
    }

    /// Whether the entity is in the error state.
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Block handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Number of fields, which is also the block size.
    pub fn size(&self) -> usize {
        self.fields.len()
    }

    /// Cell index of `field`.
    pub fn index_of(&self, field: FieldId) -> Option<usize> {
        self.fields.get_index_of(&field)
    }

    /// The cell holding `field`.
    pub fn point(&self, field: FieldId) -> Option<ValuePoint> {
        if self.error {
            return None;
        }
        self.index_of(field).map(|index| ValuePoint {
            handle: self.handle,
            index,
        })
    }

    /// Committed value of `field`, or `default`.
    pub fn get(&self, access: &dyn Access, field: FieldId, default: Integer) -> Integer {
        match self.point(field) {
            Some(p) => access.get_integer(p.handle, p.index, default),
            None => default,
        }
    }

    /// Allocate the entity's block under its own handle.
    pub fn spawn(&self) -> Impact {
        if self.error {
            return Impact::Noop;
        }
        Impact::IntegerAllocateInto {
            handle: self.handle,
            size: self.size(),
        }
    }

    /// Allocate a block of this entity's size under a fresh id, writing the
    /// new handle into `point`.
    pub fn spawn_to(&self, point: ValuePoint) -> Impact {
        if self.error {
            return Impact::Noop;
        }
        Impact::IntegerAllocate {
            size: self.size(),
            return_handle: point.handle,
            return_index: point.index,
        }
    }

    /// Free the entity's block.
    pub fn remove(&self) -> Impact {
        if self.error {
            return Impact::Noop;
        }
        Impact::IntegerDeallocate {
            handle: self.handle,
        }
    }

    /// Set `field` to `value`.
    pub fn set(&self, field: FieldId, value: Integer) -> Impact {
        match self.point(field) {
            Some(p) => Impact::IntegerSet {
                handle: p.handle,
                index: p.index,
                value,
            },
            None => Impact::Noop,
        }
    }

    /// Add `delta` to `field`.
    pub fn add(&self, field: FieldId, delta: Integer) -> Impact {
        match self.point(field) {
            Some(p) => Impact::IntegerAdd {
                handle: p.handle,
                index: p.index,
                delta,
            },
            None => Impact::Noop,
        }
    }

    /// Fill `field` with a uniform random value in `min..=max`.
    pub fn random(&self, field: FieldId, min: Integer, max: Integer) -> Impact {
        match self.point(field) {
            Some(p) => Impact::Random {
                min,
                max,
                return_handle: p.handle,
                return_index: p.index,
                return_size: 1,
            },
            None => Impact::Noop,
        }
    }

    fn errored(&self) -> Self {
        Self {
            error: true,
            ..self.clone()
        }
    }
}
