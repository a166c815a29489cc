//! Multi-dimensional learned grid index.
//!
//! A static, histogram-calibrated spatial index over fixed-arity integer
//! points, used for bitemporal coordinate lookup. The first `k-1` axes are
//! equi-partitioned into cells by streaming quantile histograms; within a
//! cell, points are sorted on the last axis and searched by an
//! interpolation-hinted binary search.
//!
//! Build once with [`GridBuilder`], then query with
//! [`SimpleGrid::range_search`]; the grid is sealed after build.

pub mod grid;
pub mod histogram;
pub mod points;
pub mod search;

pub use grid::{GridBuilder, GridConfig, SimpleGrid};
pub use histogram::Histogram;
pub use points::{FlatPoints, PointSource};
pub use search::RangeSearch;
