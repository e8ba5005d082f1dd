//! Test utilities and mock types for Chronon development.
//!
//! Provides a [`MockAccess`] implementation of the read-only state trait
//! and, in [`fixtures`], ready-made actions for driving executions and
//! controllers in tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;

use chronon_core::{Access, BufferError, Byte, Handle, Integer};

/// Mock implementation of [`Access`].
///
/// Backed by per-handle vectors. Populate blocks with
/// [`set_integers`](MockAccess::set_integers) and
/// [`set_bytes`](MockAccess::set_bytes) before handing it to a generator.
#[derive(Clone, Debug, Default)]
pub struct MockAccess {
    integers: HashMap<Handle, Vec<Integer>>,
    bytes: HashMap<Handle, Vec<Byte>>,
}

impl MockAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_integers(&mut self, handle: Handle, values: Vec<Integer>) {
        self.integers.insert(handle, values);
    }

    pub fn set_bytes(&mut self, handle: Handle, values: Vec<Byte>) {
        self.bytes.insert(handle, values);
    }
}

fn read<T: Copy>(
    blocks: &HashMap<Handle, Vec<T>>,
    handle: Handle,
    index: usize,
    out: &mut [T],
) -> Result<(), BufferError> {
    let block = blocks
        .get(&handle)
        .ok_or(BufferError::InvalidHandleId { id: handle.id })?;
    let range = index
        .checked_add(out.len())
        .filter(|&end| end <= block.len())
        .map(|end| index..end)
        .ok_or(BufferError::InvalidIndex {
            index,
            len: out.len(),
            size: block.len(),
        })?;
    out.copy_from_slice(&block[range]);
    Ok(())
}

impl Access for MockAccess {
    fn integers_size(&self, handle: Handle) -> usize {
        self.integers.get(&handle).map_or(0, Vec::len)
    }

    fn bytes_size(&self, handle: Handle) -> usize {
        self.bytes.get(&handle).map_or(0, Vec::len)
    }

    fn read_integers(
        &self,
        handle: Handle,
        index: usize,
        out: &mut [Integer],
    ) -> Result<(), BufferError> {
        read(&self.integers, handle, index, out)
    }

    fn read_bytes(&self, handle: Handle, index: usize, out: &mut [Byte]) -> Result<(), BufferError> {
        read(&self.bytes, handle, index, out)
    }

    fn get_integer(&self, handle: Handle, index: usize, default: Integer) -> Integer {
        self.integers
            .get(&handle)
            .and_then(|b| b.get(index))
            .copied()
            .unwrap_or(default)
    }

    fn get_byte(&self, handle: Handle, index: usize, default: Byte) -> Byte {
        self.bytes
            .get(&handle)
            .and_then(|b| b.get(index))
            .copied()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_reads_back_blocks() {
        let h = Handle::new(3, 1);
        let mut access = MockAccess::new();
        access.set_integers(h, vec![1, 2, 3]);
        assert_eq!(access.integers_size(h), 3);
        assert_eq!(access.get_integer(h, 2, -1), 3);
        assert_eq!(access.get_integer(h, 3, -1), -1);
        let mut out = [0; 2];
        access.read_integers(h, 1, &mut out).unwrap();
        assert_eq!(out, [2, 3]);
        assert!(access.read_integers(h, 2, &mut out).is_err());
        assert_eq!(access.get_byte(h, 0, 9), 9);
    }
}
