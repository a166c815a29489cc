//! The closed minor-type enumeration and its mappings.
//!
//! A minor type identifies the physical representation of a column. Each
//! minor type carries a stable small integer type-id used as the per-row
//! discriminant in dense-union vectors and as the key of the `append_value`
//! dispatch table, plus a companion Arrow [`DataType`] describing the buffer
//! layout.

use arrow::datatypes::{DataType, TimeUnit};
use tempora_result::{Error, Result};

/// Physical representation of a column.
///
/// The enumeration is closed: every vector in the system is one of these.
/// [`MinorType::Keyword`] is the extension family; it shares the `Utf8`
/// buffer layout with [`MinorType::Varchar`] but is a distinct logical type
/// with its own type-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorType {
    Null,
    Bigint,
    Float8,
    Varbinary,
    Varchar,
    Bit,
    Tinyint,
    TimestampMilli,
    Duration,
    Keyword,
}

impl MinorType {
    /// Stable type-id discriminant used in tagged unions and append
    /// dispatch. Ids are part of the on-wire contract and never change.
    #[inline]
    pub fn type_id(self) -> i8 {
        match self {
            MinorType::Null => 1,
            MinorType::Bigint => 2,
            MinorType::Float8 => 3,
            MinorType::Varbinary => 4,
            MinorType::Varchar => 5,
            MinorType::Bit => 6,
            MinorType::Tinyint => 7,
            MinorType::TimestampMilli => 10,
            MinorType::Duration => 18,
            MinorType::Keyword => 20,
        }
    }

    /// Inverse of [`MinorType::type_id`]. Unknown ids yield `None`.
    #[inline]
    pub fn from_type_id(id: i8) -> Option<MinorType> {
        Some(match id {
            1 => MinorType::Null,
            2 => MinorType::Bigint,
            3 => MinorType::Float8,
            4 => MinorType::Varbinary,
            5 => MinorType::Varchar,
            6 => MinorType::Bit,
            7 => MinorType::Tinyint,
            10 => MinorType::TimestampMilli,
            18 => MinorType::Duration,
            20 => MinorType::Keyword,
            _ => return None,
        })
    }

    /// The Arrow type describing this minor type's buffer layout.
    pub fn arrow_type(self) -> DataType {
        match self {
            MinorType::Null => DataType::Null,
            MinorType::Bigint => DataType::Int64,
            MinorType::Float8 => DataType::Float64,
            MinorType::Varbinary => DataType::Binary,
            MinorType::Varchar | MinorType::Keyword => DataType::Utf8,
            MinorType::Bit => DataType::Boolean,
            MinorType::Tinyint => DataType::Int8,
            MinorType::TimestampMilli => DataType::Timestamp(TimeUnit::Millisecond, None),
            MinorType::Duration => DataType::Duration(TimeUnit::Millisecond),
        }
    }

    /// Map an Arrow type back to its minor type.
    ///
    /// `Utf8` maps to [`MinorType::Varchar`]; the keyword extension family
    /// is only reachable by explicit construction, never by inference.
    pub fn from_arrow(dtype: &DataType) -> Result<MinorType> {
        match dtype {
            DataType::Null => Ok(MinorType::Null),
            DataType::Int64 => Ok(MinorType::Bigint),
            DataType::Float64 => Ok(MinorType::Float8),
            DataType::Binary => Ok(MinorType::Varbinary),
            DataType::Utf8 => Ok(MinorType::Varchar),
            DataType::Boolean => Ok(MinorType::Bit),
            DataType::Int8 => Ok(MinorType::Tinyint),
            DataType::Timestamp(TimeUnit::Millisecond, None) => Ok(MinorType::TimestampMilli),
            DataType::Duration(TimeUnit::Millisecond) => Ok(MinorType::Duration),
            other => Err(Error::unsupported_value("arrow array", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [MinorType; 10] = [
        MinorType::Null,
        MinorType::Bigint,
        MinorType::Float8,
        MinorType::Varbinary,
        MinorType::Varchar,
        MinorType::Bit,
        MinorType::Tinyint,
        MinorType::TimestampMilli,
        MinorType::Duration,
        MinorType::Keyword,
    ];

    #[test]
    fn type_ids_round_trip() {
        for mt in ALL {
            assert_eq!(MinorType::from_type_id(mt.type_id()), Some(mt));
        }
    }

    #[test]
    fn unknown_type_id_is_none() {
        assert_eq!(MinorType::from_type_id(0), None);
        assert_eq!(MinorType::from_type_id(99), None);
    }

    #[test]
    fn arrow_round_trip_for_inferable_types() {
        for mt in ALL {
            if mt == MinorType::Keyword {
                // Utf8 infers as Varchar, never Keyword.
                assert_eq!(
                    MinorType::from_arrow(&mt.arrow_type()).unwrap(),
                    MinorType::Varchar
                );
            } else {
                assert_eq!(MinorType::from_arrow(&mt.arrow_type()).unwrap(), mt);
            }
        }
    }

    #[test]
    fn unsupported_arrow_type_errors() {
        let err = MinorType::from_arrow(&DataType::Int32).unwrap_err();
        assert!(matches!(
            err,
            tempora_result::Error::UnsupportedValueType { .. }
        ));
    }
}
