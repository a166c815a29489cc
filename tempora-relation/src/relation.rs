//! Relations: insertion-ordered named collections of columns.
//!
//! A [`ReadRelation`] snapshots a set of read columns sharing one row count;
//! an [`AppendRelation`] grows a set of append columns created on demand by
//! its column factory. `select`, `copy_rel_from` and [`RowCopier`] are the
//! row-wise composition utilities operators build on.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use tempora_buffer::BufferAllocator;
use tempora_result::{Error, Result};
use tempora_types::MinorType;

use crate::append_column::{
    AppendColumn, FreshAppendColumn, IndirectAppendColumn, TypedAppendColumn,
};
use crate::read_column::ReadColumn;

/// An immutable relation: ordered named read columns plus a row count.
///
/// Clones are cheap reference copies. Multiple read-only consumers may share
/// one relation as long as none closes it while others read.
#[derive(Clone)]
pub struct ReadRelation {
    columns: Vec<ReadColumn>,
    by_name: FxHashMap<Arc<str>, usize>,
    row_count: usize,
}

impl ReadRelation {
    /// Build a relation from columns that already agree on `row_count`.
    /// Duplicate column names are rejected.
    pub fn new(columns: Vec<ReadColumn>, row_count: usize) -> Result<ReadRelation> {
        let mut by_name = FxHashMap::default();
        for (i, col) in columns.iter().enumerate() {
            let name: Arc<str> = col.name().into();
            if by_name.insert(name, i).is_some() {
                return Err(Error::InvalidArgumentError(format!(
                    "duplicate column name: {}",
                    col.name()
                )));
            }
        }
        Ok(ReadRelation {
            columns,
            by_name,
            row_count,
        })
    }

    /// Wrap an Arrow record batch, preserving field order. Each field
    /// vector becomes a direct read column; the relation owns nothing.
    pub fn from_batch(batch: &RecordBatch) -> Result<ReadRelation> {
        let mut columns = Vec::with_capacity(batch.num_columns());
        for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
            columns.push(ReadColumn::from_array(field.name().as_str(), array)?);
        }
        ReadRelation::new(columns, batch.num_rows())
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[ReadColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ReadColumn> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    /// Materialize an indirectly-selected relation over the chosen rows.
    ///
    /// Each column is fed through a zero-copy indirect append column, so the
    /// result records `(vector, index)` pairs instead of copying values. The
    /// result's row count equals `indices.len()`.
    pub fn select(&self, indices: &[i32]) -> Result<ReadRelation> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut out = AppendColumn::Indirect(IndirectAppendColumn::new(col.name()));
            for &i in indices {
                out.append_from(col, i as usize)?;
            }
            columns.push(out.read());
        }
        ReadRelation::new(columns, indices.len())
    }

    /// Release every column exactly once. Idempotent.
    pub fn close(&mut self) {
        for col in &mut self.columns {
            col.close();
        }
    }
}

impl std::fmt::Debug for ReadRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadRelation")
            .field("rows", &self.row_count)
            .field("columns", &self.columns)
            .finish()
    }
}

/// How an append relation creates columns on first reference.
#[derive(Clone)]
pub enum ColumnFactory {
    /// Zero-copy `(vector, index)` recorders.
    Indirect,
    /// Allocator-backed heterogeneous builders.
    Fresh { allocator: BufferAllocator },
    /// Allocator-backed homogeneous builders of one minor type.
    Typed {
        allocator: BufferAllocator,
        minor: MinorType,
    },
}

impl ColumnFactory {
    fn create(&self, name: &str) -> Result<AppendColumn> {
        Ok(match self {
            ColumnFactory::Indirect => {
                AppendColumn::Indirect(IndirectAppendColumn::new(name))
            }
            ColumnFactory::Fresh { allocator } => {
                AppendColumn::Fresh(FreshAppendColumn::new(name, allocator.clone()))
            }
            ColumnFactory::Typed { allocator, minor } => {
                AppendColumn::Typed(TypedAppendColumn::new(name, *minor, allocator)?)
            }
        })
    }
}

/// A growing relation of append columns.
///
/// Columns are created through the factory on first `append_column` and are
/// borrowed from the relation: closing the relation closes them.
pub struct AppendRelation {
    factory: ColumnFactory,
    columns: Vec<AppendColumn>,
    by_name: FxHashMap<Arc<str>, usize>,
}

impl AppendRelation {
    pub fn new(factory: ColumnFactory) -> AppendRelation {
        AppendRelation {
            factory,
            columns: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// The append column named `name`, created through the factory if it
    /// does not exist yet. This is the only way to extend the schema.
    pub fn append_column(&mut self, name: &str) -> Result<&mut AppendColumn> {
        if let Some(&i) = self.by_name.get(name) {
            return Ok(&mut self.columns[i]);
        }
        let col = self.factory.create(name)?;
        let i = self.columns.len();
        self.by_name.insert(name.into(), i);
        self.columns.push(col);
        Ok(&mut self.columns[i])
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[AppendColumn] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = &mut AppendColumn> {
        self.columns.iter_mut()
    }

    /// Snapshot every column into a new read relation.
    ///
    /// All columns must agree on their value counts; anything else is a
    /// fatal [`Error::ShapeMismatch`].
    pub fn read(&self) -> Result<ReadRelation> {
        let mut row_count = None;
        for col in &self.columns {
            let count = col.value_count();
            match row_count {
                None => row_count = Some(count),
                Some(expected) if expected != count => {
                    return Err(Error::ShapeMismatch {
                        column: col.name().to_string(),
                        expected,
                        actual: count,
                    });
                }
                Some(_) => {}
            }
        }
        let columns = self.columns.iter().map(|c| c.read()).collect();
        ReadRelation::new(columns, row_count.unwrap_or(0))
    }

    /// Drop every column. Idempotent; builders refund their budget.
    pub fn close(&mut self) {
        self.columns.clear();
        self.by_name.clear();
    }
}

/// Append `length` rows of `src` starting at `offset` into the matching
/// destination columns, creating them as needed.
pub fn copy_rel_from(
    dst: &mut AppendRelation,
    src: &ReadRelation,
    offset: usize,
    length: usize,
) -> Result<()> {
    if offset + length > src.row_count() {
        return Err(Error::InvalidArgumentError(format!(
            "copy of rows {offset}..{} out of {} available",
            offset + length,
            src.row_count()
        )));
    }
    for col in src.columns() {
        let out = dst.append_column(col.name())?;
        for i in offset..offset + length {
            out.append_from(col, i)?;
        }
    }
    Ok(())
}

/// Row-driven copier pairing destination and source columns by name.
///
/// Used by operators that emit rows one at a time (joins, filters): pairing
/// happens once, then `copy_row` appends a row across all pairs.
pub struct RowCopier<'a> {
    pairs: Vec<(&'a mut AppendColumn, &'a ReadColumn)>,
}

impl RowCopier<'_> {
    /// Append row `i` of every source column to its destination.
    pub fn copy_row(&mut self, i: usize) -> Result<()> {
        for (dst, src) in &mut self.pairs {
            dst.append_from(src, i)?;
        }
        Ok(())
    }
}

/// Pair every source column with the same-named destination column,
/// creating destinations through the factory as needed.
pub fn row_copier<'a>(
    dst: &'a mut AppendRelation,
    src: &'a ReadRelation,
) -> Result<RowCopier<'a>> {
    for col in src.columns() {
        dst.append_column(col.name())?;
    }
    let mut pairs = Vec::with_capacity(src.columns().len());
    for out in dst.columns_mut() {
        let name = out.name().to_string();
        if let Some(source) = src.column(&name) {
            pairs.push((out, source));
        }
    }
    Ok(RowCopier { pairs })
}
