//! Mutable vector builders.
//!
//! A [`VectorBuilder`] is the write side of a leaf vector: one Arrow builder
//! bound to a single minor type, charging a [`BufferAllocator`] reservation
//! as it grows. Appends always write the next row; nulls increment the row
//! count without setting the validity bit.

use std::sync::Arc;

use arrow::array::{
    ArrayBuilder, ArrayRef, BinaryBuilder, BooleanBuilder, DurationMillisecondBuilder,
    Float64Builder, Int8Builder, Int64Builder, NullBuilder, StringBuilder,
    TimestampMillisecondBuilder,
};
use tempora_buffer::{BufferAllocator, Reservation};
use tempora_result::{Error, Result};
use tempora_types::{MinorType, Value};

use crate::vector::Vector;

enum BuilderRepr {
    Null(NullBuilder),
    Bool(BooleanBuilder),
    Byte(Int8Builder),
    Long(Int64Builder),
    Double(Float64Builder),
    Str(StringBuilder),
    Bytes(BinaryBuilder),
    Date(TimestampMillisecondBuilder),
    Duration(DurationMillisecondBuilder),
}

/// Builder for one leaf vector of a fixed minor type.
pub struct VectorBuilder {
    minor: MinorType,
    repr: BuilderRepr,
    reservation: Reservation,
}

impl VectorBuilder {
    /// A fresh builder charging `allocator`.
    pub fn new(minor: MinorType, allocator: &BufferAllocator) -> Result<VectorBuilder> {
        let repr = match minor {
            MinorType::Null => BuilderRepr::Null(NullBuilder::new()),
            MinorType::Bit => BuilderRepr::Bool(BooleanBuilder::new()),
            MinorType::Tinyint => BuilderRepr::Byte(Int8Builder::new()),
            MinorType::Bigint => BuilderRepr::Long(Int64Builder::new()),
            MinorType::Float8 => BuilderRepr::Double(Float64Builder::new()),
            MinorType::Varchar | MinorType::Keyword => BuilderRepr::Str(StringBuilder::new()),
            MinorType::Varbinary => BuilderRepr::Bytes(BinaryBuilder::new()),
            MinorType::TimestampMilli => {
                BuilderRepr::Date(TimestampMillisecondBuilder::new())
            }
            MinorType::Duration => BuilderRepr::Duration(DurationMillisecondBuilder::new()),
        };
        Ok(VectorBuilder {
            minor,
            repr,
            reservation: allocator.reserve(0)?,
        })
    }

    #[inline]
    pub fn minor_type(&self) -> MinorType {
        self.minor
    }

    /// Rows appended so far.
    pub fn len(&self) -> usize {
        match &self.repr {
            BuilderRepr::Null(b) => b.len(),
            BuilderRepr::Bool(b) => b.len(),
            BuilderRepr::Byte(b) => b.len(),
            BuilderRepr::Long(b) => b.len(),
            BuilderRepr::Double(b) => b.len(),
            BuilderRepr::Str(b) => b.len(),
            BuilderRepr::Bytes(b) => b.len(),
            BuilderRepr::Date(b) => b.len(),
            BuilderRepr::Duration(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mismatch(&self, what: &str) -> Error {
        Error::InvalidArgumentError(format!(
            "cannot append {what} to a {:?} builder",
            self.minor
        ))
    }

    /// Append a null row: the count grows, no validity bit is set.
    pub fn append_null(&mut self) -> Result<()> {
        self.reservation.grow(1)?;
        match &mut self.repr {
            BuilderRepr::Null(b) => b.append_null(),
            BuilderRepr::Bool(b) => b.append_null(),
            BuilderRepr::Byte(b) => b.append_null(),
            BuilderRepr::Long(b) => b.append_null(),
            BuilderRepr::Double(b) => b.append_null(),
            BuilderRepr::Str(b) => b.append_null(),
            BuilderRepr::Bytes(b) => b.append_null(),
            BuilderRepr::Date(b) => b.append_null(),
            BuilderRepr::Duration(b) => b.append_null(),
        }
        Ok(())
    }

    pub fn append_bool(&mut self, v: bool) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Bool(b) => {
                self.reservation.grow(1)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn append_byte(&mut self, v: i8) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Byte(b) => {
                self.reservation.grow(1)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("byte")),
        }
    }

    pub fn append_long(&mut self, v: i64) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Long(b) => {
                self.reservation.grow(8)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("long")),
        }
    }

    pub fn append_double(&mut self, v: f64) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Double(b) => {
                self.reservation.grow(8)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("double")),
        }
    }

    pub fn append_str(&mut self, v: &str) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Str(b) => {
                self.reservation.grow(v.len() + 5)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn append_bytes(&mut self, v: &[u8]) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Bytes(b) => {
                self.reservation.grow(v.len() + 5)?;
                b.append_value(v);
                Ok(())
            }
            _ => Err(self.mismatch("bytes")),
        }
    }

    pub fn append_date(&mut self, millis: i64) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Date(b) => {
                self.reservation.grow(8)?;
                b.append_value(millis);
                Ok(())
            }
            _ => Err(self.mismatch("date")),
        }
    }

    pub fn append_duration(&mut self, millis: i64) -> Result<()> {
        match &mut self.repr {
            BuilderRepr::Duration(b) => {
                self.reservation.grow(8)?;
                b.append_value(millis);
                Ok(())
            }
            _ => Err(self.mismatch("duration")),
        }
    }

    /// Append a host value. The value's minor type must match the builder's
    /// (string-layout builders accept both strings and keywords).
    pub fn append_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.append_null(),
            Value::Bool(v) => self.append_bool(*v),
            Value::Byte(v) => self.append_byte(*v),
            Value::Long(v) => self.append_long(*v),
            Value::Double(v) => self.append_double(*v),
            Value::Str(v) | Value::Keyword(v) => self.append_str(v),
            Value::Bytes(v) => self.append_bytes(v),
            Value::Date(v) => self.append_date(*v),
            Value::Duration(v) => self.append_duration(*v),
        }
    }

    /// Null-safe single-row copy from a leaf vector.
    ///
    /// The source's minor type must match the builder's; `append_from` on
    /// the column layer guarantees this by routing on the leaf type.
    pub fn copy_from(&mut self, src: &Vector, idx: usize) -> Result<()> {
        if src.is_null(idx) {
            return self.append_null();
        }
        if src.minor_type() != self.minor {
            return Err(Error::InvalidArgumentError(format!(
                "cannot copy a {:?} value into a {:?} builder",
                src.minor_type(),
                self.minor
            )));
        }
        match self.minor {
            MinorType::Null => self.append_null(),
            MinorType::Bit => self.append_bool(src.get_bool(idx)),
            MinorType::Tinyint => self.append_byte(src.get_byte(idx)),
            MinorType::Bigint => self.append_long(src.get_long(idx)),
            MinorType::Float8 => self.append_double(src.get_double(idx)),
            MinorType::Varchar | MinorType::Keyword => self.append_str(src.get_str(idx)),
            MinorType::Varbinary => self.append_bytes(src.get_bytes(idx)),
            MinorType::TimestampMilli => self.append_date(src.get_date(idx)),
            MinorType::Duration => self.append_duration(src.get_duration(idx)),
        }
    }

    /// Non-destructive freeze: a vector over everything appended so far.
    /// The builder keeps accepting appends afterwards.
    pub fn snapshot(&self) -> Arc<Vector> {
        let array: ArrayRef = match &self.repr {
            BuilderRepr::Null(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Bool(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Byte(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Long(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Double(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Str(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Bytes(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Date(b) => Arc::new(b.finish_cloned()),
            BuilderRepr::Duration(b) => Arc::new(b.finish_cloned()),
        };
        Vector::with_reservation(self.minor, array, None)
    }

    /// Destructive freeze: the final vector takes over the reservation, so
    /// the budget follows the data until the last reference drops.
    pub fn finish(mut self) -> Arc<Vector> {
        let array: ArrayRef = match &mut self.repr {
            BuilderRepr::Null(b) => Arc::new(b.finish()),
            BuilderRepr::Bool(b) => Arc::new(b.finish()),
            BuilderRepr::Byte(b) => Arc::new(b.finish()),
            BuilderRepr::Long(b) => Arc::new(b.finish()),
            BuilderRepr::Double(b) => Arc::new(b.finish()),
            BuilderRepr::Str(b) => Arc::new(b.finish()),
            BuilderRepr::Bytes(b) => Arc::new(b.finish()),
            BuilderRepr::Date(b) => Arc::new(b.finish()),
            BuilderRepr::Duration(b) => Arc::new(b.finish()),
        };
        Vector::with_reservation(self.minor, array, Some(self.reservation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trip() -> Result<()> {
        let alloc = BufferAllocator::unbounded();
        let mut b = VectorBuilder::new(MinorType::Bigint, &alloc)?;
        b.append_long(1)?;
        b.append_null()?;
        b.append_long(3)?;
        let v = b.snapshot();
        assert_eq!(v.value_count(), 3);
        assert_eq!(v.get_long(0), 1);
        assert!(v.is_null(1));
        assert_eq!(v.get_long(2), 3);
        Ok(())
    }

    #[test]
    fn snapshot_leaves_builder_usable() -> Result<()> {
        let alloc = BufferAllocator::unbounded();
        let mut b = VectorBuilder::new(MinorType::Varchar, &alloc)?;
        b.append_str("a")?;
        let first = b.snapshot();
        b.append_str("b")?;
        let second = b.snapshot();
        assert_eq!(first.value_count(), 1);
        assert_eq!(second.value_count(), 2);
        assert_eq!(second.get_str(1), "b");
        Ok(())
    }

    #[test]
    fn mismatched_append_is_rejected() -> Result<()> {
        let alloc = BufferAllocator::unbounded();
        let mut b = VectorBuilder::new(MinorType::Bigint, &alloc)?;
        assert!(matches!(
            b.append_str("nope"),
            Err(Error::InvalidArgumentError(_))
        ));
        Ok(())
    }

    #[test]
    fn budget_exhaustion_surfaces() -> Result<()> {
        let alloc = BufferAllocator::new(16);
        let mut b = VectorBuilder::new(MinorType::Bigint, &alloc)?;
        b.append_long(1)?;
        b.append_long(2)?;
        assert!(matches!(
            b.append_long(3),
            Err(Error::AllocationFailed { .. })
        ));
        Ok(())
    }
}
