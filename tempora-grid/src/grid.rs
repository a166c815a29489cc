//! Grid construction and the sealed grid structure.
//!
//! Build pipeline: stream the points once through per-axis histograms, fit
//! the cell geometry from the total count, derive per-axis quantile scales,
//! then stream again routing each point into its cell. Cells are finished
//! by sorting on the last axis and fitting `(slope, base)` interpolation
//! coefficients for the in-cell search.

use std::sync::Arc;

use arrow::array::{Array, FixedSizeListArray, Int64Array};
use arrow::datatypes::{DataType, Field};
use tempora_buffer::{BufferAllocator, Reservation};
use tempora_result::{Error, Result};
use tracing::debug;

use crate::histogram::Histogram;
use crate::points::PointSource;
use crate::search::RangeSearch;

/// Grid build options.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Bin bound for the per-axis calibration histograms.
    pub max_histogram_bins: usize,
    /// Target points per cell. Must be a power of two.
    pub cell_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_histogram_bins: 1024,
            cell_size: 1024,
        }
    }
}

/// One populated cell: a fixed-size-list vector of k-tuples, sorted
/// ascending on the last axis.
pub(crate) struct GridCell {
    list: FixedSizeListArray,
    // Flat view over the same buffer; coordinate reads go through this.
    flat: Int64Array,
}

impl GridCell {
    fn from_rows(k: usize, data: Vec<i64>) -> GridCell {
        let flat = Int64Array::from(data);
        let item = Arc::new(Field::new("item", DataType::Int64, false));
        let list = FixedSizeListArray::new(item, k as i32, Arc::new(flat.clone()), None);
        GridCell { list, flat }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub(crate) fn coord(&self, row: usize, axis: usize, k: usize) -> i64 {
        self.flat.value(row * k + axis)
    }
}

/// A sealed spatial index over n k-dimensional integer points.
///
/// The first `k-1` axes partition points into cells via quantile scales;
/// the last axis is kept sorted within each cell. A point's global index is
/// `(cell_idx << cell_shift) | intra_cell_idx`.
pub struct SimpleGrid {
    k: usize,
    cells_per_dimension: usize,
    axis_shift: u32,
    cell_shift: u32,
    // Quantile upper bounds for the first k-1 axes.
    scales: Vec<Vec<f64>>,
    mins: Vec<i64>,
    maxs: Vec<i64>,
    cells: Vec<Option<GridCell>>,
    // (slope, base) per cell for last-axis interpolation search.
    slope_base: Vec<f64>,
    total: usize,
    _reservation: Option<Reservation>,
}

impl SimpleGrid {
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn cell_shift(&self) -> u32 {
        self.cell_shift
    }

    #[inline]
    pub fn cells_per_dimension(&self) -> usize {
        self.cells_per_dimension
    }

    /// Floor of the observed per-axis minima.
    pub fn mins(&self) -> &[i64] {
        &self.mins
    }

    /// Ceiling of the observed per-axis maxima.
    pub fn maxs(&self) -> &[i64] {
        &self.maxs
    }

    pub(crate) fn axis_shift(&self) -> u32 {
        self.axis_shift
    }

    pub(crate) fn cell(&self, idx: usize) -> Option<&GridCell> {
        self.cells.get(idx).and_then(|c| c.as_ref())
    }

    pub(crate) fn slope(&self, cell: usize) -> f64 {
        self.slope_base[2 * cell]
    }

    pub(crate) fn base(&self, cell: usize) -> f64 {
        self.slope_base[2 * cell + 1]
    }

    /// Insertion position of `v` in the axis's scale sequence, clamped to
    /// the addressable cell range.
    pub(crate) fn scale_index(&self, axis: usize, v: i64) -> usize {
        self.scales[axis]
            .partition_point(|&s| s < v as f64)
            .min(self.cells_per_dimension - 1)
    }

    /// The grid is sealed after build.
    pub fn insert(&mut self, _point: &[i64]) -> Result<()> {
        Err(Error::OperationNotSupported(
            "grid is sealed after build; insert is not supported",
        ))
    }

    /// The grid is sealed after build.
    pub fn delete(&mut self, _point: &[i64]) -> Result<()> {
        Err(Error::OperationNotSupported(
            "grid is sealed after build; delete is not supported",
        ))
    }

    /// Decode a global index back into its point, if it addresses a live
    /// row.
    pub fn get_point(&self, global: i64) -> Option<Vec<i64>> {
        let (cell_idx, row) = self.decode(global)?;
        let cell = self.cell(cell_idx)?;
        if row >= cell.len() {
            return None;
        }
        Some((0..self.k).map(|a| cell.coord(row, a, self.k)).collect())
    }

    /// Single-coordinate access for a decoded global index.
    pub fn point_coord(&self, global: i64, axis: usize) -> Option<i64> {
        let (cell_idx, row) = self.decode(global)?;
        let cell = self.cell(cell_idx)?;
        if row >= cell.len() || axis >= self.k {
            return None;
        }
        Some(cell.coord(row, axis, self.k))
    }

    fn decode(&self, global: i64) -> Option<(usize, usize)> {
        if global < 0 {
            return None;
        }
        let cell = (global >> self.cell_shift) as usize;
        let row = (global & ((1i64 << self.cell_shift) - 1)) as usize;
        (cell < self.cells.len()).then_some((cell, row))
    }

    /// All global indices in cell order, lazily.
    pub fn points(&self) -> impl Iterator<Item = i64> + '_ {
        let shift = self.cell_shift;
        self.cells.iter().enumerate().flat_map(move |(ci, cell)| {
            let len = cell.as_ref().map_or(0, |c| c.len());
            (0..len).map(move |r| ((ci as i64) << shift) | r as i64)
        })
    }

    /// Lazily enumerate global indices of points inside the inclusive
    /// `[min_range, max_range]` box. A range disjoint from the grid on any
    /// axis yields an empty sequence, not an error.
    pub fn range_search(&self, min_range: &[i64], max_range: &[i64]) -> RangeSearch<'_> {
        debug_assert_eq!(min_range.len(), self.k);
        debug_assert_eq!(max_range.len(), self.k);
        RangeSearch::new(self, min_range, max_range)
    }

    /// Release all cell vectors. Idempotent; the grid reads as empty
    /// afterwards.
    pub fn close(&mut self) {
        self.cells.clear();
        self.total = 0;
        if let Some(r) = self._reservation.as_mut() {
            r.release();
        }
    }
}

impl PointSource for SimpleGrid {
    fn arity(&self) -> usize {
        self.k
    }

    fn count(&self) -> usize {
        self.total
    }

    fn visit(&self, f: &mut dyn FnMut(&[i64])) {
        let mut row = vec![0i64; self.k];
        for cell in self.cells.iter().flatten() {
            for r in 0..cell.len() {
                for (a, slot) in row.iter_mut().enumerate() {
                    *slot = cell.coord(r, a, self.k);
                }
                f(&row);
            }
        }
    }
}

impl std::fmt::Debug for SimpleGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleGrid")
            .field("k", &self.k)
            .field("total", &self.total)
            .field("cells", &self.cells.len())
            .field("cells_per_dimension", &self.cells_per_dimension)
            .finish()
    }
}

/// Builder for [`SimpleGrid`].
pub struct GridBuilder {
    allocator: BufferAllocator,
    k: usize,
    config: GridConfig,
}

impl GridBuilder {
    pub fn new(allocator: BufferAllocator, k: usize, config: GridConfig) -> Result<GridBuilder> {
        if k < 2 {
            return Err(Error::InvalidArgumentError(format!(
                "grid arity must be at least 2, got {k}"
            )));
        }
        if config.cell_size == 0 || !config.cell_size.is_power_of_two() {
            return Err(Error::InvalidArgumentError(format!(
                "cell_size must be a power of two, got {}",
                config.cell_size
            )));
        }
        if config.max_histogram_bins < 2 {
            return Err(Error::InvalidArgumentError(
                "max_histogram_bins must be at least 2".into(),
            ));
        }
        Ok(GridBuilder {
            allocator,
            k,
            config,
        })
    }

    /// Build a sealed grid from a finite point source.
    pub fn build<S: PointSource + ?Sized>(self, source: &S) -> Result<SimpleGrid> {
        let k = self.k;
        // The 12-bit headroom lets a cell outgrow its target size without
        // colliding in the global index space.
        let cell_shift = (self.config.cell_size << 12).trailing_zeros();

        // Pass 1: calibrate one histogram per axis.
        let mut histograms = vec![Histogram::with_max_bins(self.config.max_histogram_bins); k];
        let mut total = 0usize;
        let mut bad_arity = None;
        source.visit(&mut |p| {
            if p.len() != k {
                bad_arity = Some(p.len());
                return;
            }
            total += 1;
            for (d, hist) in histograms.iter_mut().enumerate() {
                hist.update(p[d] as f64);
            }
        });
        if let Some(got) = bad_arity {
            return Err(Error::InvalidArgumentError(format!(
                "point of arity {got} fed to a grid of arity {k}"
            )));
        }

        if total == 0 {
            return Ok(SimpleGrid {
                k,
                cells_per_dimension: 1,
                axis_shift: 0,
                cell_shift,
                scales: vec![Vec::new(); k - 1],
                mins: vec![0; k],
                maxs: vec![0; k],
                cells: vec![None],
                slope_base: vec![0.0; 2],
                total: 0,
                _reservation: None,
            });
        }

        // Geometry: enough cells for the target occupancy, equi-split
        // across the first k-1 axes and rounded up to a power of two.
        let target_cells = total.div_ceil(self.config.cell_size);
        let cells_per_dimension = nth_root_ceil(target_cells, k - 1).next_power_of_two();
        let axis_shift = cells_per_dimension.trailing_zeros();
        let number_of_cells = cells_per_dimension.pow((k - 1) as u32);
        debug!(
            total,
            cells_per_dimension, number_of_cells, axis_shift, cell_shift, "fitted grid geometry"
        );

        let scales: Vec<Vec<f64>> = histograms[..k - 1]
            .iter()
            .map(|h| h.uniform(cells_per_dimension))
            .collect();
        let mins: Vec<i64> = histograms
            .iter()
            .map(|h| h.min().unwrap_or(0.0).floor() as i64)
            .collect();
        let maxs: Vec<i64> = histograms
            .iter()
            .map(|h| h.max().unwrap_or(0.0).ceil() as i64)
            .collect();

        // Pass 2: route every point into its cell.
        let mut reservation = self.allocator.reserve(0)?;
        let mut buffers: Vec<Option<Vec<i64>>> = Vec::new();
        buffers.resize_with(number_of_cells, || None);
        let mut failure: Option<Error> = None;
        source.visit(&mut |p| {
            if failure.is_some() {
                return;
            }
            if let Err(e) = reservation.grow(k * 8) {
                failure = Some(e);
                return;
            }
            let mut cell = 0usize;
            for d in (0..k - 1).rev() {
                let idx = scales[d]
                    .partition_point(|&s| s < p[d] as f64)
                    .min(cells_per_dimension - 1);
                cell = (cell << axis_shift) | idx;
            }
            buffers[cell].get_or_insert_with(Vec::new).extend_from_slice(p);
        });
        if let Some(e) = failure {
            return Err(e);
        }

        // Finish each populated cell: interpolation coefficients, then the
        // last-axis sort.
        let mut slope_base = vec![0.0f64; 2 * number_of_cells];
        let mut cells: Vec<Option<GridCell>> = Vec::with_capacity(number_of_cells);
        let last_min = mins[k - 1] as f64;
        let last_max = maxs[k - 1] as f64;
        for (ci, buffer) in buffers.into_iter().enumerate() {
            match buffer {
                None => cells.push(None),
                Some(mut data) => {
                    let rows = data.len() / k;
                    let mut slope = rows as f64 / (last_max - last_min);
                    if !slope.is_finite() {
                        slope = 0.0;
                    }
                    slope_base[2 * ci] = slope;
                    slope_base[2 * ci + 1] = -slope * last_min;
                    sort_by_last_axis(&mut data, k);
                    cells.push(Some(GridCell::from_rows(k, data)));
                }
            }
        }

        Ok(SimpleGrid {
            k,
            cells_per_dimension,
            axis_shift,
            cell_shift,
            scales,
            mins,
            maxs,
            cells,
            slope_base,
            total,
            _reservation: Some(reservation),
        })
    }
}

/// Smallest integer whose `n`th power covers `value`, tolerant of the
/// floating error `powf` introduces for exact powers.
fn nth_root_ceil(value: usize, n: usize) -> usize {
    if value <= 1 {
        return 1;
    }
    let root = (value as f64).powf(1.0 / n as f64);
    let rounded = root.round();
    let candidate = if (root - rounded).abs() < 1e-9 {
        rounded
    } else {
        root.ceil()
    };
    (candidate as usize).max(1)
}

/// Three-way (Dutch-flag) quicksort of k-strided rows on the last axis,
/// recursing into the smaller partition and looping on the larger.
fn sort_by_last_axis(data: &mut [i64], k: usize) {
    let rows = (data.len() / k) as isize;
    quicksort_rows(data, k, 0, rows - 1);
}

fn quicksort_rows(data: &mut [i64], k: usize, mut lo: isize, mut hi: isize) {
    while lo < hi {
        let (lt, gt) = partition_rows(data, k, lo, hi);
        if lt - lo < hi - gt {
            quicksort_rows(data, k, lo, lt - 1);
            lo = gt + 1;
        } else {
            quicksort_rows(data, k, gt + 1, hi);
            hi = lt - 1;
        }
    }
}

fn partition_rows(data: &mut [i64], k: usize, lo: isize, hi: isize) -> (isize, isize) {
    let last = k - 1;
    let pivot = data[((lo + hi) / 2) as usize * k + last];
    let (mut lt, mut i, mut gt) = (lo, lo, hi);
    while i <= gt {
        let c = data[i as usize * k + last];
        if c < pivot {
            swap_rows(data, k, lt as usize, i as usize);
            lt += 1;
            i += 1;
        } else if c > pivot {
            swap_rows(data, k, i as usize, gt as usize);
            gt -= 1;
        } else {
            i += 1;
        }
    }
    (lt, gt)
}

fn swap_rows(data: &mut [i64], k: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    for j in 0..k {
        data.swap(a * k + j, b * k + j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_root_ceil_handles_exact_powers() {
        assert_eq!(nth_root_ceil(8, 3), 2);
        assert_eq!(nth_root_ceil(9, 3), 3);
        assert_eq!(nth_root_ceil(1, 3), 1);
        assert_eq!(nth_root_ceil(27, 3), 3);
        assert_eq!(nth_root_ceil(16, 2), 4);
    }

    #[test]
    fn sort_by_last_axis_orders_rows() {
        let mut data = vec![
            1, 1, 9, //
            2, 2, 3, //
            3, 3, 7, //
            4, 4, 3, //
        ];
        sort_by_last_axis(&mut data, 3);
        let lasts: Vec<i64> = data.chunks_exact(3).map(|r| r[2]).collect();
        assert_eq!(lasts, vec![3, 3, 7, 9]);
        // Rows stay intact while moving.
        for row in data.chunks_exact(3) {
            assert_eq!(row[0], row[1]);
        }
    }
}
