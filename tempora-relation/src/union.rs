//! Dense-union vectors.
//!
//! A dense union is a tagged-union vector: a per-row type-id byte selecting
//! a typed child vector, and a per-row offset into that child. `get_child`
//! and `get_offset` are the primitive accessors everything else builds on.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UnionArray};
use arrow::datatypes::{DataType, UnionMode};
use rustc_hash::FxHashSet;
use tempora_result::{Error, Result};
use tempora_types::MinorType;

use crate::vector::Vector;

/// A composite value vector over an Arrow dense [`UnionArray`].
///
/// Children are wrapped as leaf [`Vector`]s once at construction, so per-row
/// dispatch is a type-id lookup rather than a downcast.
pub struct UnionVector {
    array: ArrayRef,
    children: Vec<(i8, Arc<Vector>)>,
}

impl UnionVector {
    /// Wrap an Arrow dense union array.
    ///
    /// Sparse unions and non-union arrays are rejected; nested unions are
    /// not supported as children.
    pub fn from_array(array: ArrayRef) -> Result<Arc<UnionVector>> {
        let union = array
            .as_any()
            .downcast_ref::<UnionArray>()
            .ok_or_else(|| Error::InvalidArgumentError("expected a union array".into()))?;
        let DataType::Union(fields, UnionMode::Dense) = array.data_type() else {
            return Err(Error::InvalidArgumentError(
                "only dense unions are supported".into(),
            ));
        };
        let mut children = Vec::with_capacity(fields.len());
        for (type_id, _field) in fields.iter() {
            let child = Vector::from_array(Arc::clone(union.child(type_id)))?;
            children.push((type_id, child));
        }
        Ok(Arc::new(UnionVector { array, children }))
    }

    fn union(&self) -> &UnionArray {
        // Checked at construction.
        self.array
            .as_any()
            .downcast_ref::<UnionArray>()
            .expect("backing array is a union")
    }

    #[inline]
    pub fn value_count(&self) -> usize {
        self.array.len()
    }

    /// Type-id byte of row `i`.
    #[inline]
    pub fn type_id(&self, i: usize) -> i8 {
        self.union().type_id(i)
    }

    /// Offset of row `i` into the child selected by its type-id.
    #[inline]
    pub fn offset(&self, i: usize) -> usize {
        self.union().value_offset(i)
    }

    /// The child vector registered under `type_id`.
    pub fn child(&self, type_id: i8) -> Option<&Arc<Vector>> {
        self.children
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, v)| v)
    }

    /// Child vectors in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Arc<Vector>> {
        self.children.iter().map(|(_, v)| v)
    }

    /// Minor types of children that actually hold values.
    ///
    /// This is a cache of observed content, not the union's declared schema:
    /// children with zero rows are excluded.
    pub fn observed_minor_types(&self) -> FxHashSet<MinorType> {
        self.children
            .iter()
            .filter(|(_, v)| v.value_count() > 0)
            .map(|(_, v)| v.minor_type())
            .collect()
    }
}

impl std::fmt::Debug for UnionVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionVector")
            .field("len", &self.value_count())
            .field("children", &self.children.len())
            .finish()
    }
}
