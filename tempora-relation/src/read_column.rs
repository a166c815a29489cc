//! Read columns: one logical column, five physical layouts.
//!
//! A read column is a named, read-only sequence of values polymorphic over
//! how rows map to leaf vectors:
//!
//! | Variant            | Backing                          | Per-row leaf            |
//! |--------------------|----------------------------------|-------------------------|
//! | Direct             | one vector, 1:1 rows             | `(vec, i)`              |
//! | Indirect           | one vector + i32 selection       | `(vec, idxs[i])`        |
//! | DenseUnion         | one dense-union vector           | `(child(tid(i)), off(i))` |
//! | IndirectDenseUnion | dense union + i32 selection      | via `idxs[i]`           |
//! | Materialized       | one `(vector, index)` pair per row | `(vecs[i], idxs[i])`  |
//!
//! Every variant exposes the same contract; `internal_vector` and
//! `internal_index` resolve a row to its leaf cell, unwrapping indirection
//! and union dispatch, which is all downstream copy needs.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;
use rustc_hash::FxHashSet;
use tempora_result::Result;
use tempora_types::{MinorType, Value};

use crate::union::UnionVector;
use crate::vector::Vector;

#[derive(Clone)]
enum ColumnRepr {
    Direct {
        vector: Arc<Vector>,
    },
    Indirect {
        vector: Arc<Vector>,
        indices: Arc<[i32]>,
    },
    DenseUnion {
        union: Arc<UnionVector>,
    },
    IndirectDenseUnion {
        union: Arc<UnionVector>,
        indices: Arc<[i32]>,
    },
    Materialized {
        minor_types: Arc<FxHashSet<MinorType>>,
        vectors: Arc<[Arc<Vector>]>,
        indices: Arc<[i32]>,
    },
}

/// A named read-only view over columnar data.
///
/// Clones are cheap reference copies sharing all backing storage. The
/// column additionally carries the set of vectors it owns: [`ReadColumn::close`]
/// drops that set exactly once, and views produced by [`ReadColumn::rename`]
/// own nothing.
#[derive(Clone)]
pub struct ReadColumn {
    name: Arc<str>,
    owned: Vec<Arc<Vector>>,
    repr: ColumnRepr,
}

/// De-duplicate vectors by pointer identity, preserving first-seen order.
pub(crate) fn dedup_by_identity(vectors: impl IntoIterator<Item = Arc<Vector>>) -> Vec<Arc<Vector>> {
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut out = Vec::new();
    for v in vectors {
        if seen.insert(Arc::as_ptr(&v) as usize) {
            out.push(v);
        }
    }
    out
}

impl ReadColumn {
    /// A direct 1:1 view over a leaf vector. The view does not own the
    /// vector.
    pub fn from_vector(name: impl Into<Arc<str>>, vector: Arc<Vector>) -> ReadColumn {
        ReadColumn {
            name: name.into(),
            owned: Vec::new(),
            repr: ColumnRepr::Direct { vector },
        }
    }

    /// A direct view that also owns its vector, used for snapshots that
    /// exist only for the view reading them.
    pub(crate) fn from_vector_owned(name: Arc<str>, vector: Arc<Vector>) -> ReadColumn {
        ReadColumn {
            name,
            owned: vec![Arc::clone(&vector)],
            repr: ColumnRepr::Direct { vector },
        }
    }

    /// A direct view over a dense-union vector.
    pub fn from_union(name: impl Into<Arc<str>>, union: Arc<UnionVector>) -> ReadColumn {
        ReadColumn {
            name: name.into(),
            owned: Vec::new(),
            repr: ColumnRepr::DenseUnion { union },
        }
    }

    /// An indirectly-selected view: row `i` reads `vector[indices[i]]`.
    pub fn from_vector_with_indices(
        name: impl Into<Arc<str>>,
        vector: Arc<Vector>,
        indices: Arc<[i32]>,
    ) -> ReadColumn {
        ReadColumn {
            name: name.into(),
            owned: Vec::new(),
            repr: ColumnRepr::Indirect { vector, indices },
        }
    }

    /// An indirectly-selected view over a dense union.
    pub fn from_union_with_indices(
        name: impl Into<Arc<str>>,
        union: Arc<UnionVector>,
        indices: Arc<[i32]>,
    ) -> ReadColumn {
        ReadColumn {
            name: name.into(),
            owned: Vec::new(),
            repr: ColumnRepr::IndirectDenseUnion { union, indices },
        }
    }

    /// A materialized view: one `(vector, index)` pair per logical row.
    ///
    /// `owned` is the set of vectors the view closes on drop; producers pass
    /// the de-duplicated union of their inputs so the view keeps them alive.
    pub fn materialized(
        name: impl Into<Arc<str>>,
        minor_types: FxHashSet<MinorType>,
        owned: Vec<Arc<Vector>>,
        vectors: Arc<[Arc<Vector>]>,
        indices: Arc<[i32]>,
    ) -> ReadColumn {
        debug_assert_eq!(vectors.len(), indices.len());
        ReadColumn {
            name: name.into(),
            owned: dedup_by_identity(owned),
            repr: ColumnRepr::Materialized {
                minor_types: Arc::new(minor_types),
                vectors,
                indices,
            },
        }
    }

    /// Wrap an Arrow array as a direct column, dispatching on its type:
    /// dense-union arrays become union-dispatch views.
    pub fn from_array(name: impl Into<Arc<str>>, array: &ArrayRef) -> Result<ReadColumn> {
        match array.data_type() {
            DataType::Union(..) => Ok(ReadColumn::from_union(
                name,
                UnionVector::from_array(Arc::clone(array))?,
            )),
            _ => Ok(ReadColumn::from_vector(
                name,
                Vector::from_array(Arc::clone(array))?,
            )),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A renamed view sharing all backing storage. O(1); the new view owns
    /// no vectors, so closing it releases nothing.
    pub fn rename(&self, name: impl Into<Arc<str>>) -> ReadColumn {
        ReadColumn {
            name: name.into(),
            owned: Vec::new(),
            repr: self.repr.clone(),
        }
    }

    /// Logical row count of this view.
    pub fn value_count(&self) -> usize {
        match &self.repr {
            ColumnRepr::Direct { vector } => vector.value_count(),
            ColumnRepr::Indirect { indices, .. } => indices.len(),
            ColumnRepr::DenseUnion { union } => union.value_count(),
            ColumnRepr::IndirectDenseUnion { indices, .. } => indices.len(),
            ColumnRepr::Materialized { indices, .. } => indices.len(),
        }
    }

    /// The set of minor types actually observed in this view.
    ///
    /// A singleton for non-union variants with rows; for union variants the
    /// set of child types holding values; for materialized views whatever
    /// the producer recorded.
    pub fn minor_types(&self) -> FxHashSet<MinorType> {
        match &self.repr {
            ColumnRepr::Direct { vector } | ColumnRepr::Indirect { vector, .. } => {
                if self.value_count() > 0 {
                    std::iter::once(vector.minor_type()).collect()
                } else {
                    FxHashSet::default()
                }
            }
            ColumnRepr::DenseUnion { union } | ColumnRepr::IndirectDenseUnion { union, .. } => {
                union.observed_minor_types()
            }
            ColumnRepr::Materialized { minor_types, .. } => (**minor_types).clone(),
        }
    }

    /// Resolve row `i` through the variant's row mapping.
    #[inline]
    fn backing_row(&self, i: usize) -> usize {
        match &self.repr {
            ColumnRepr::Direct { .. } | ColumnRepr::DenseUnion { .. } => i,
            ColumnRepr::Indirect { indices, .. }
            | ColumnRepr::IndirectDenseUnion { indices, .. }
            | ColumnRepr::Materialized { indices, .. } => indices[i] as usize,
        }
    }

    /// The leaf vector behind row `i`, unwrapping indirection and union
    /// dispatch. Non-union variants ignore `i`.
    pub fn internal_vector(&self, i: usize) -> &Arc<Vector> {
        match &self.repr {
            ColumnRepr::Direct { vector } | ColumnRepr::Indirect { vector, .. } => vector,
            ColumnRepr::DenseUnion { union } => {
                let tid = union.type_id(self.backing_row(i));
                union
                    .child(tid)
                    .expect("dense union row references a registered type id")
            }
            ColumnRepr::IndirectDenseUnion { union, .. } => {
                let tid = union.type_id(self.backing_row(i));
                union
                    .child(tid)
                    .expect("dense union row references a registered type id")
            }
            ColumnRepr::Materialized { vectors, .. } => &vectors[i],
        }
    }

    /// The leaf row index behind row `i`.
    pub fn internal_index(&self, i: usize) -> usize {
        match &self.repr {
            ColumnRepr::Direct { .. } => i,
            ColumnRepr::Indirect { .. } => self.backing_row(i),
            ColumnRepr::DenseUnion { union } | ColumnRepr::IndirectDenseUnion { union, .. } => {
                union.offset(self.backing_row(i))
            }
            ColumnRepr::Materialized { .. } => self.backing_row(i),
        }
    }

    #[inline]
    fn leaf(&self, i: usize) -> (&Arc<Vector>, usize) {
        (self.internal_vector(i), self.internal_index(i))
    }

    pub fn is_null(&self, i: usize) -> bool {
        let (v, j) = self.leaf(i);
        v.is_null(j)
    }

    pub fn get_bool(&self, i: usize) -> bool {
        let (v, j) = self.leaf(i);
        v.get_bool(j)
    }

    pub fn get_byte(&self, i: usize) -> i8 {
        let (v, j) = self.leaf(i);
        v.get_byte(j)
    }

    pub fn get_long(&self, i: usize) -> i64 {
        let (v, j) = self.leaf(i);
        v.get_long(j)
    }

    pub fn get_double(&self, i: usize) -> f64 {
        let (v, j) = self.leaf(i);
        v.get_double(j)
    }

    pub fn get_str(&self, i: usize) -> &str {
        let (v, j) = self.leaf(i);
        v.get_str(j)
    }

    pub fn get_bytes(&self, i: usize) -> &[u8] {
        let (v, j) = self.leaf(i);
        v.get_bytes(j)
    }

    pub fn get_date(&self, i: usize) -> i64 {
        let (v, j) = self.leaf(i);
        v.get_date(j)
    }

    pub fn get_duration(&self, i: usize) -> i64 {
        let (v, j) = self.leaf(i);
        v.get_duration(j)
    }

    /// Canonical host-value read; nulls surface as [`Value::Null`].
    pub fn get_value(&self, i: usize) -> Value {
        let (v, j) = self.leaf(i);
        v.get_value(j)
    }

    /// Vectors this view will release when closed or dropped.
    pub fn owned_vectors(&self) -> &[Arc<Vector>] {
        &self.owned
    }

    /// Release owned vectors. Idempotent; the view remains readable as long
    /// as something else keeps the backing storage alive.
    pub fn close(&mut self) {
        self.owned.clear();
    }
}

impl std::fmt::Debug for ReadColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match &self.repr {
            ColumnRepr::Direct { .. } => "Direct",
            ColumnRepr::Indirect { .. } => "Indirect",
            ColumnRepr::DenseUnion { .. } => "DenseUnion",
            ColumnRepr::IndirectDenseUnion { .. } => "IndirectDenseUnion",
            ColumnRepr::Materialized { .. } => "Materialized",
        };
        f.debug_struct("ReadColumn")
            .field("name", &self.name)
            .field("variant", &variant)
            .field("rows", &self.value_count())
            .finish()
    }
}
