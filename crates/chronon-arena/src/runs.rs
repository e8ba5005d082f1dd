//! Occupancy bookkeeping for buffer cells.
//!
//! Every cell records whether it is free and its distance to the end of the
//! run it belongs to. An occupied run is exactly one block; a free run is a
//! maximal stretch of free cells. Scanning from offset 0 and stepping by
//! run length therefore visits each run once, and freeing a block merges it
//! with its free neighbours in time proportional to the merged run.

use std::collections::TryReserveError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    free: bool,
    /// Distance to the end of the run, counting this cell.
    len: usize,
}

/// Per-cell run table.
#[derive(Clone, Debug, Default)]
pub(crate) struct RunMap {
    runs: Vec<Run>,
}

impl RunMap {
    /// First free run with room for `size` cells.
    pub(crate) fn find(&self, size: usize) -> Option<usize> {
        let mut offset = 0;
        while offset < self.runs.len() {
            let run = self.runs[offset];
            if run.free && run.len >= size {
                return Some(offset);
            }
            offset += run.len;
        }
        None
    }

    /// Where growth should start: the trailing free run, or the end.
    pub(crate) fn grow_offset(&self) -> usize {
        let mut offset = self.runs.len();
        while offset > 0 && self.runs[offset - 1].free {
            offset -= 1;
        }
        offset
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.runs.try_reserve(additional)
    }

    /// Extend with free cells up to `new_len`.
    pub(crate) fn grow_to(&mut self, new_len: usize) {
        if new_len <= self.runs.len() {
            return;
        }
        let start = self.grow_offset();
        self.runs.resize(new_len, Run { free: true, len: 0 });
        self.relabel(start, new_len, true);
    }

    /// Mark `offset..offset + size` as one occupied run.
    ///
    /// The range must lie inside a free run. Cells of that run past the
    /// range keep their distances, which stay correct.
    pub(crate) fn occupy(&mut self, offset: usize, size: usize) {
        self.relabel(offset, offset + size, false);
    }

    /// Free the occupied run starting at `offset` and merge it with its
    /// free neighbours.
    pub(crate) fn release(&mut self, offset: usize) {
        let mut begin = offset;
        while begin > 0 && self.runs[begin - 1].free {
            begin -= 1;
        }
        let mut end = offset + self.runs[offset].len;
        while end < self.runs.len() && self.runs[end].free {
            end += self.runs[end].len;
        }
        self.relabel(begin, end, true);
    }

    /// Number of free cells.
    pub(crate) fn free_cells(&self) -> usize {
        self.runs.iter().filter(|r| r.free).count()
    }

    fn relabel(&mut self, begin: usize, end: usize, free: bool) {
        for (i, run) in self.runs[begin..end].iter_mut().enumerate() {
            *run = Run {
                free,
                len: end - begin - i,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(len: usize) -> RunMap {
        let mut map = RunMap::default();
        map.grow_to(len);
        map
    }

    #[test]
    fn first_fit_skips_small_runs() {
        let mut map = map_with(10);
        map.occupy(0, 2);
        map.occupy(2, 1);
        map.occupy(3, 3);
        map.release(2);
        // Free: [2..3) and [6..10).
        assert_eq!(map.find(1), Some(2));
        assert_eq!(map.find(2), Some(6));
        assert_eq!(map.find(5), None);
    }

    #[test]
    fn release_merges_both_sides() {
        let mut map = map_with(6);
        map.occupy(0, 2);
        map.occupy(2, 2);
        map.occupy(4, 2);
        map.release(0);
        map.release(4);
        map.release(2);
        assert_eq!(map.free_cells(), 6);
        assert_eq!(map.find(6), Some(0));
    }

    #[test]
    fn growth_starts_at_trailing_free_run() {
        let mut map = map_with(4);
        map.occupy(0, 2);
        assert_eq!(map.grow_offset(), 2);
        map.grow_to(7);
        assert_eq!(map.find(5), Some(2));
    }

    #[test]
    fn split_run_keeps_remainder_reachable() {
        let mut map = map_with(8);
        map.occupy(0, 3);
        assert_eq!(map.find(5), Some(3));
        map.occupy(3, 2);
        assert_eq!(map.find(3), Some(5));
        assert_eq!(map.free_cells(), 3);
    }
}
