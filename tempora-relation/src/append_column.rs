//! Append columns: the write side of the relation layer.
//!
//! Three builders share one interface:
//!
//! - [`TypedAppendColumn`] is bound at construction to a single minor type
//!   with its own freshly allocated vector.
//! - [`FreshAppendColumn`] lazily allocates one vector per minor type it
//!   encounters and keeps a per-append trail so `read()` can materialize the
//!   exact append order.
//! - [`IndirectAppendColumn`] records `(vector, index)` pairs without
//!   copying; it is the substrate of zero-copy row selection.
//!
//! All appends write the next logical row; `read()` snapshots what has been
//! appended so far without disturbing the builder.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tempora_buffer::BufferAllocator;
use tempora_result::{Error, Result};
use tempora_types::{MinorType, Value};

use crate::builder::VectorBuilder;
use crate::read_column::{ReadColumn, dedup_by_identity};
use crate::vector::Vector;

/// Homogeneous append column: one minor type, one backing vector.
pub struct TypedAppendColumn {
    name: Arc<str>,
    builder: VectorBuilder,
}

impl TypedAppendColumn {
    pub fn new(
        name: impl Into<Arc<str>>,
        minor: MinorType,
        allocator: &BufferAllocator,
    ) -> Result<TypedAppendColumn> {
        Ok(TypedAppendColumn {
            name: name.into(),
            builder: VectorBuilder::new(minor, allocator)?,
        })
    }

    pub fn minor_type(&self) -> MinorType {
        self.builder.minor_type()
    }

    fn read(&self) -> ReadColumn {
        ReadColumn::from_vector_owned(Arc::clone(&self.name), self.builder.snapshot())
    }
}

/// Heterogeneous append column: one lazily-created vector per minor type,
/// plus the per-append `(vector, row)` trail that `read()` replays.
pub struct FreshAppendColumn {
    name: Arc<str>,
    allocator: BufferAllocator,
    builders: Vec<VectorBuilder>,
    by_minor: FxHashMap<MinorType, usize>,
    // Parallel per-append trail: builder slot and row within that builder.
    slots: Vec<u32>,
    row_indices: Vec<i32>,
}

impl FreshAppendColumn {
    pub fn new(name: impl Into<Arc<str>>, allocator: BufferAllocator) -> FreshAppendColumn {
        FreshAppendColumn {
            name: name.into(),
            allocator,
            builders: Vec::new(),
            by_minor: FxHashMap::default(),
            slots: Vec::new(),
            row_indices: Vec::new(),
        }
    }

    /// Slot of the builder for `minor`, creating it on first use.
    fn writer(&mut self, minor: MinorType) -> Result<usize> {
        if let Some(&slot) = self.by_minor.get(&minor) {
            return Ok(slot);
        }
        let slot = self.builders.len();
        self.builders.push(VectorBuilder::new(minor, &self.allocator)?);
        self.by_minor.insert(minor, slot);
        Ok(slot)
    }

    fn record(&mut self, slot: usize) {
        self.slots.push(slot as u32);
        self.row_indices.push(self.builders[slot].len() as i32);
    }

    fn append_with(
        &mut self,
        minor: MinorType,
        write: impl FnOnce(&mut VectorBuilder) -> Result<()>,
    ) -> Result<()> {
        let slot = self.writer(minor)?;
        self.record(slot);
        write(&mut self.builders[slot])
    }

    fn read(&self) -> ReadColumn {
        let snapshots: Vec<Arc<Vector>> = self.builders.iter().map(|b| b.snapshot()).collect();
        let vectors: Vec<Arc<Vector>> = self
            .slots
            .iter()
            .map(|&slot| Arc::clone(&snapshots[slot as usize]))
            .collect();
        let minor_types: FxHashSet<MinorType> = self.by_minor.keys().copied().collect();
        ReadColumn::materialized(
            Arc::clone(&self.name),
            minor_types,
            snapshots,
            vectors.into(),
            self.row_indices.clone().into(),
        )
    }
}

/// Zero-copy append column: a per-append trail of borrowed leaf cells.
///
/// Only `append_from` is defined; typed appends have nowhere to write and
/// fail with [`Error::OperationNotSupported`].
pub struct IndirectAppendColumn {
    name: Arc<str>,
    vectors: Vec<Arc<Vector>>,
    indices: Vec<i32>,
    minor_types: FxHashSet<MinorType>,
}

impl IndirectAppendColumn {
    pub fn new(name: impl Into<Arc<str>>) -> IndirectAppendColumn {
        IndirectAppendColumn {
            name: name.into(),
            vectors: Vec::new(),
            indices: Vec::new(),
            minor_types: FxHashSet::default(),
        }
    }

    fn append_from(&mut self, src: &ReadColumn, i: usize) {
        let vector = Arc::clone(src.internal_vector(i));
        self.minor_types.insert(vector.minor_type());
        self.indices.push(src.internal_index(i) as i32);
        self.vectors.push(vector);
    }

    fn read(&self) -> ReadColumn {
        ReadColumn::materialized(
            Arc::clone(&self.name),
            self.minor_types.clone(),
            dedup_by_identity(self.vectors.iter().cloned()),
            self.vectors.clone().into(),
            self.indices.clone().into(),
        )
    }
}

/// A write-only builder for one logical column.
pub enum AppendColumn {
    Typed(TypedAppendColumn),
    Fresh(FreshAppendColumn),
    Indirect(IndirectAppendColumn),
}

impl AppendColumn {
    pub fn name(&self) -> &str {
        match self {
            AppendColumn::Typed(c) => &c.name,
            AppendColumn::Fresh(c) => &c.name,
            AppendColumn::Indirect(c) => &c.name,
        }
    }

    /// Logical rows appended so far.
    pub fn value_count(&self) -> usize {
        match self {
            AppendColumn::Typed(c) => c.builder.len(),
            AppendColumn::Fresh(c) => c.slots.len(),
            AppendColumn::Indirect(c) => c.indices.len(),
        }
    }

    fn no_direct_appends(&self) -> Result<()> {
        Err(Error::OperationNotSupported(
            "indirect append columns only accept append_from",
        ))
    }

    pub fn append_null(&mut self) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_null(),
            AppendColumn::Fresh(c) => {
                c.append_with(MinorType::Null, |b| b.append_null())
            }
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_bool(&mut self, v: bool) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_bool(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Bit, |b| b.append_bool(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_byte(&mut self, v: i8) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_byte(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Tinyint, |b| b.append_byte(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_long(&mut self, v: i64) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_long(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Bigint, |b| b.append_long(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_double(&mut self, v: f64) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_double(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Float8, |b| b.append_double(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_string(&mut self, v: &str) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_str(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Varchar, |b| b.append_str(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_keyword(&mut self, v: &str) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_str(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Keyword, |b| b.append_str(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_bytes(&mut self, v: &[u8]) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_bytes(v),
            AppendColumn::Fresh(c) => c.append_with(MinorType::Varbinary, |b| b.append_bytes(v)),
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_date(&mut self, millis: i64) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_date(millis),
            AppendColumn::Fresh(c) => {
                c.append_with(MinorType::TimestampMilli, |b| b.append_date(millis))
            }
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    pub fn append_duration(&mut self, millis: i64) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => c.builder.append_duration(millis),
            AppendColumn::Fresh(c) => {
                c.append_with(MinorType::Duration, |b| b.append_duration(millis))
            }
            AppendColumn::Indirect(_) => self.no_direct_appends(),
        }
    }

    /// Append a host value, dispatching on its runtime type-id.
    ///
    /// The dispatch is total over the closed [`Value`] enumeration; values
    /// with no minor-type mapping are rejected before they can become a
    /// `Value` (see [`MinorType::from_arrow`]).
    pub fn append_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.append_null(),
            Value::Bool(v) => self.append_bool(*v),
            Value::Byte(v) => self.append_byte(*v),
            Value::Long(v) => self.append_long(*v),
            Value::Double(v) => self.append_double(*v),
            Value::Str(v) => self.append_string(v),
            Value::Keyword(v) => self.append_keyword(v),
            Value::Bytes(v) => self.append_bytes(v),
            Value::Date(v) => self.append_date(*v),
            Value::Duration(v) => self.append_duration(*v),
        }
    }

    /// Copy row `i` of a read column into the next row of this column.
    ///
    /// Resolves the source's leaf cell via `internal_vector`/`internal_index`
    /// and routes on the leaf minor type, so union and indirect sources
    /// copy exactly what the row holds.
    pub fn append_from(&mut self, src: &ReadColumn, i: usize) -> Result<()> {
        match self {
            AppendColumn::Typed(c) => {
                let (v, j) = (src.internal_vector(i), src.internal_index(i));
                c.builder.copy_from(v, j)
            }
            AppendColumn::Fresh(c) => {
                let vector = Arc::clone(src.internal_vector(i));
                let j = src.internal_index(i);
                c.append_with(vector.minor_type(), |b| b.copy_from(&vector, j))
            }
            AppendColumn::Indirect(c) => {
                c.append_from(src, i);
                Ok(())
            }
        }
    }

    /// Snapshot everything appended so far as a read column.
    pub fn read(&self) -> ReadColumn {
        match self {
            AppendColumn::Typed(c) => c.read(),
            AppendColumn::Fresh(c) => c.read(),
            AppendColumn::Indirect(c) => c.read(),
        }
    }
}
