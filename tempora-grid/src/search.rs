//! Lazy range search over a sealed grid.
//!
//! The iterator enumerates the Cartesian product of per-axis cell ranges,
//! and inside each candidate cell binary-searches the sorted last axis with
//! an interpolation hint. Producing the next global index is O(log cell)
//! amortized after per-cell setup and allocates nothing; consumers may stop
//! early at any point.

use crate::grid::{GridCell, SimpleGrid};

/// Lazy sequence of global point indices inside an inclusive box.
///
/// Within a cell, emitted indices ascend; across cells, ordering follows
/// the Cartesian enumeration of axis indices with the last axis most
/// significant.
pub struct RangeSearch<'a> {
    grid: &'a SimpleGrid,
    min: Vec<i64>,
    max: Vec<i64>,
    // Inclusive cell-index ranges for the first k-1 axes, plus which ends
    // of each axis only partially cover their boundary cells.
    axis_ranges: Vec<(usize, usize)>,
    lower_partial: Vec<bool>,
    upper_partial: Vec<bool>,
    last_partial: bool,
    cursor: Vec<usize>,
    pending_first: bool,
    exhausted: bool,
    // Current cell, if positioned inside one.
    cell: Option<&'a GridCell>,
    cell_idx: usize,
    cell_mask: u32,
    pos: usize,
    end: usize,
}

impl<'a> RangeSearch<'a> {
    pub(crate) fn new(grid: &'a SimpleGrid, min_range: &[i64], max_range: &[i64]) -> Self {
        let k = grid.k();
        let mut search = RangeSearch {
            grid,
            min: min_range.to_vec(),
            max: max_range.to_vec(),
            axis_ranges: Vec::with_capacity(k - 1),
            lower_partial: Vec::with_capacity(k - 1),
            upper_partial: Vec::with_capacity(k - 1),
            last_partial: false,
            cursor: Vec::with_capacity(k - 1),
            pending_first: true,
            exhausted: false,
            cell: None,
            cell_idx: 0,
            cell_mask: 0,
            pos: 0,
            end: 0,
        };

        if grid.total() == 0 {
            search.exhausted = true;
            return search;
        }
        for d in 0..k {
            // Empty or inverted on any axis: nothing can match.
            if search.min[d] > search.max[d]
                || search.min[d] > grid.maxs()[d]
                || search.max[d] < grid.mins()[d]
            {
                search.exhausted = true;
                return search;
            }
        }

        for d in 0..k - 1 {
            let lo = grid.scale_index(d, search.min[d]);
            let hi = grid.scale_index(d, search.max[d]);
            search.axis_ranges.push((lo, hi));
            search.lower_partial.push(search.min[d] > grid.mins()[d]);
            search.upper_partial.push(search.max[d] < grid.maxs()[d]);
            search.cursor.push(lo);
        }
        search.last_partial =
            search.min[k - 1] > grid.mins()[k - 1] || search.max[k - 1] < grid.maxs()[k - 1];
        search
    }

    fn row_ok(&self, cell: &GridCell, row: usize) -> bool {
        let k = self.grid.k();
        for d in 0..self.cursor.len() {
            if self.cell_mask & (1 << d) != 0 {
                let c = cell.coord(row, d, k);
                if c < self.min[d] || c > self.max[d] {
                    return false;
                }
            }
        }
        true
    }

    /// Position on the next candidate cell with matching rows. Returns
    /// false once the Cartesian enumeration is exhausted.
    fn advance_cell(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        loop {
            if self.pending_first {
                self.pending_first = false;
            } else {
                let mut d = 0;
                loop {
                    if d == self.cursor.len() {
                        self.exhausted = true;
                        return false;
                    }
                    if self.cursor[d] < self.axis_ranges[d].1 {
                        self.cursor[d] += 1;
                        break;
                    }
                    self.cursor[d] = self.axis_ranges[d].0;
                    d += 1;
                }
            }

            let mut cell_idx = 0usize;
            for d in (0..self.cursor.len()).rev() {
                cell_idx = (cell_idx << self.grid.axis_shift()) | self.cursor[d];
            }
            let mut mask = 0u32;
            for d in 0..self.cursor.len() {
                let (lo, hi) = self.axis_ranges[d];
                if (self.cursor[d] == lo && self.lower_partial[d])
                    || (self.cursor[d] == hi && self.upper_partial[d])
                {
                    mask |= 1 << d;
                }
            }

            let Some(cell) = self.grid.cell(cell_idx) else {
                continue;
            };
            if cell.len() == 0 {
                continue;
            }

            let k = self.grid.k();
            let (start, end) = if self.last_partial {
                let slope = self.grid.slope(cell_idx);
                let base = self.grid.base(cell_idx);
                let lo_t = self.min[k - 1];
                let hi_t = self.max[k - 1];
                let start = search_leftmost(cell, k, slope * lo_t as f64 + base, lo_t);
                let end = search_rightmost(cell, k, slope * hi_t as f64 + base, hi_t);
                (start, end)
            } else {
                (0, cell.len() as i64 - 1)
            };
            if start > end {
                continue;
            }

            self.cell = Some(cell);
            self.cell_idx = cell_idx;
            self.cell_mask = mask;
            self.pos = start as usize;
            self.end = end as usize;
            return true;
        }
    }
}

impl Iterator for RangeSearch<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            if let Some(cell) = self.cell {
                while self.pos <= self.end {
                    let row = self.pos;
                    self.pos += 1;
                    if self.cell_mask == 0 || self.row_ok(cell, row) {
                        return Some(
                            ((self.cell_idx as i64) << self.grid.cell_shift()) | row as i64,
                        );
                    }
                }
                self.cell = None;
            }
            if !self.advance_cell() {
                return None;
            }
        }
    }
}

/// First row whose last-axis coordinate is >= `target`, probing the
/// interpolation hint first and narrowing conventionally.
fn search_leftmost(cell: &GridCell, k: usize, hint: f64, target: i64) -> i64 {
    let n = cell.len() as i64;
    let mut lo = 0i64;
    let mut hi = n - 1;
    let mut m = clamp_hint(hint, n);
    while lo <= hi {
        if cell.coord(m as usize, k - 1, k) < target {
            lo = m + 1;
        } else {
            hi = m - 1;
        }
        m = (lo + hi) >> 1;
    }
    lo
}

/// Last row whose last-axis coordinate is <= `target`; -1 when none is.
fn search_rightmost(cell: &GridCell, k: usize, hint: f64, target: i64) -> i64 {
    let n = cell.len() as i64;
    let mut lo = 0i64;
    let mut hi = n - 1;
    let mut m = clamp_hint(hint, n);
    while lo <= hi {
        if cell.coord(m as usize, k - 1, k) <= target {
            lo = m + 1;
        } else {
            hi = m - 1;
        }
        m = (lo + hi) >> 1;
    }
    hi
}

fn clamp_hint(hint: f64, n: i64) -> i64 {
    if hint.is_finite() {
        (hint as i64).clamp(0, n - 1)
    } else {
        (n - 1) / 2
    }
}
