//! Tempora: the columnar relational runtime of a bitemporal, append-only
//! database engine.
//!
//! This crate is the single surface over the `tempora-*` workspace. Two
//! subsystems make up the core:
//!
//! - **The heterogeneous relation layer** ([`tempora-relation`]): a
//!   zero-copy abstraction over Arrow columnar buffers unifying direct
//!   vectors, indirectly-indexed vectors, and dense-union vectors behind one
//!   read/append interface. Operators compose relations either by indirect
//!   selection, recording `(vector, index)` pairs without copying, or by
//!   fresh materialization into newly allocated vectors.
//! - **The grid index** ([`tempora-grid`]): a static, histogram-calibrated
//!   spatial index over fixed-arity integer points, used for bitemporal
//!   coordinate lookup. Build routes points into quantile-partitioned cells
//!   and seals the structure; range search lazily yields global point
//!   indices that feed back into the relation layer as selection vectors.
//!
//! Around them sit the ambient crates: [`tempora-types`] for the closed
//! minor-type registry and host values, [`tempora-buffer`] for the budgeted
//! allocator every vector charges, and [`tempora-result`] for the unified
//! error type.
//!
//! The SQL front-end, planner, operator DAG, transaction ingestion, and
//! object storage live outside this workspace; they consume relations and
//! selection vectors through the interfaces re-exported here.
//!
//! [`tempora-relation`]: tempora_relation
//! [`tempora-grid`]: tempora_grid
//! [`tempora-types`]: tempora_types
//! [`tempora-buffer`]: tempora_buffer
//! [`tempora-result`]: tempora_result

pub use tempora_buffer::{BufferAllocator, Reservation};
pub use tempora_grid::{
    FlatPoints, GridBuilder, GridConfig, Histogram, PointSource, RangeSearch, SimpleGrid,
};
pub use tempora_relation::{
    AppendColumn, AppendRelation, ColumnFactory, FreshAppendColumn, IndirectAppendColumn,
    ReadColumn, ReadRelation, RowCopier, TypedAppendColumn, UnionVector, Vector, VectorBuilder,
    copy_rel_from, row_copier,
};
pub use tempora_result::{Error, Result};
pub use tempora_types::{MinorType, Value};
