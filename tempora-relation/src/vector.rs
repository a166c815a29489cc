//! Leaf value vectors.
//!
//! A [`Vector`] is an immutable, reference-counted value sequence backed by
//! one Arrow array: a validity bitmap, an offset buffer for variable-width
//! types, and a data buffer, all managed by Arrow. Vectors are the leaves
//! every column variant ultimately resolves to via `internal_vector`.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, DurationMillisecondArray, Float64Array, Int8Array,
    Int64Array, StringArray, TimestampMillisecondArray,
};
use tempora_buffer::Reservation;
use tempora_result::Result;
use tempora_types::{MinorType, Value};

/// An immutable leaf value vector.
///
/// Typed getters are *undefined but safe* when the requested type does not
/// match the vector's minor type: they return the type's default value
/// instead of panicking. Callers are expected to consult
/// [`Vector::minor_type`] (or a column's `minor_types` set) first.
pub struct Vector {
    minor: MinorType,
    array: ArrayRef,
    // Held only so dropping the last reference refunds the budget.
    _reservation: Option<Reservation>,
}

impl Vector {
    /// Wrap an Arrow array, inferring its minor type.
    ///
    /// The vector does not charge any allocator; the array's buffers are
    /// owned by whoever produced them.
    pub fn from_array(array: ArrayRef) -> Result<Arc<Vector>> {
        let minor = MinorType::from_arrow(array.data_type())?;
        Ok(Arc::new(Vector {
            minor,
            array,
            _reservation: None,
        }))
    }

    /// Wrap an array under an explicit minor type, carrying the builder's
    /// reservation so the budget follows the data.
    pub(crate) fn with_reservation(
        minor: MinorType,
        array: ArrayRef,
        reservation: Option<Reservation>,
    ) -> Arc<Vector> {
        Arc::new(Vector {
            minor,
            array,
            _reservation: reservation,
        })
    }

    #[inline]
    pub fn minor_type(&self) -> MinorType {
        self.minor
    }

    #[inline]
    pub fn value_count(&self) -> usize {
        self.array.len()
    }

    /// The backing Arrow array.
    #[inline]
    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    /// Validity of row `i`.
    ///
    /// `NullArray` carries no physical validity buffer, so the null minor
    /// type is special-cased: every row is null.
    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        self.minor == MinorType::Null || self.array.is_null(i)
    }

    #[inline]
    pub fn get_bool(&self, i: usize) -> bool {
        self.array
            .as_any()
            .downcast_ref::<BooleanArray>()
            .is_some_and(|a| a.value(i))
    }

    #[inline]
    pub fn get_byte(&self, i: usize) -> i8 {
        self.array
            .as_any()
            .downcast_ref::<Int8Array>()
            .map_or(0, |a| a.value(i))
    }

    #[inline]
    pub fn get_long(&self, i: usize) -> i64 {
        self.array
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(0, |a| a.value(i))
    }

    #[inline]
    pub fn get_double(&self, i: usize) -> f64 {
        self.array
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(0.0, |a| a.value(i))
    }

    #[inline]
    pub fn get_str(&self, i: usize) -> &str {
        self.array
            .as_any()
            .downcast_ref::<StringArray>()
            .map_or("", |a| a.value(i))
    }

    #[inline]
    pub fn get_bytes(&self, i: usize) -> &[u8] {
        self.array
            .as_any()
            .downcast_ref::<BinaryArray>()
            .map(|a| a.value(i))
            .unwrap_or_default()
    }

    /// Milliseconds since the Unix epoch.
    #[inline]
    pub fn get_date(&self, i: usize) -> i64 {
        self.array
            .as_any()
            .downcast_ref::<TimestampMillisecondArray>()
            .map_or(0, |a| a.value(i))
    }

    /// Milliseconds of elapsed time.
    #[inline]
    pub fn get_duration(&self, i: usize) -> i64 {
        self.array
            .as_any()
            .downcast_ref::<DurationMillisecondArray>()
            .map_or(0, |a| a.value(i))
    }

    /// Canonical host-value read, dispatching on the minor type.
    pub fn get_value(&self, i: usize) -> Value {
        if self.is_null(i) {
            return Value::Null;
        }
        match self.minor {
            MinorType::Null => Value::Null,
            MinorType::Bit => Value::Bool(self.get_bool(i)),
            MinorType::Tinyint => Value::Byte(self.get_byte(i)),
            MinorType::Bigint => Value::Long(self.get_long(i)),
            MinorType::Float8 => Value::Double(self.get_double(i)),
            MinorType::Varchar => Value::Str(self.get_str(i).to_string()),
            MinorType::Keyword => Value::Keyword(self.get_str(i).to_string()),
            MinorType::Varbinary => Value::Bytes(self.get_bytes(i).to_vec()),
            MinorType::TimestampMilli => Value::Date(self.get_date(i)),
            MinorType::Duration => Value::Duration(self.get_duration(i)),
        }
    }
}

impl std::fmt::Debug for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("minor", &self.minor)
            .field("len", &self.value_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::NullArray;

    #[test]
    fn wraps_and_reads_primitives() -> Result<()> {
        let v = Vector::from_array(Arc::new(Int64Array::from(vec![10, 20, 30])))?;
        assert_eq!(v.minor_type(), MinorType::Bigint);
        assert_eq!(v.value_count(), 3);
        assert_eq!(v.get_long(1), 20);
        assert_eq!(v.get_value(2), Value::Long(30));
        Ok(())
    }

    #[test]
    fn mismatched_getter_is_safe() -> Result<()> {
        let v = Vector::from_array(Arc::new(StringArray::from(vec!["a"])))?;
        assert_eq!(v.get_long(0), 0);
        assert_eq!(v.get_str(0), "a");
        Ok(())
    }

    #[test]
    fn null_array_rows_are_null() -> Result<()> {
        let v = Vector::from_array(Arc::new(NullArray::new(2)))?;
        assert!(v.is_null(0));
        assert_eq!(v.get_value(1), Value::Null);
        Ok(())
    }

    #[test]
    fn nullable_values_surface_as_null() -> Result<()> {
        let v = Vector::from_array(Arc::new(Int64Array::from(vec![Some(1), None])))?;
        assert!(!v.is_null(0));
        assert!(v.is_null(1));
        assert_eq!(v.get_value(1), Value::Null);
        Ok(())
    }
}
