//! The canonical host value.
//!
//! A [`Value`] is what any cell of the system reads back as: `get_value`
//! anywhere in the relation layer produces one, with [`Value::Null`] as the
//! distinguished absent value. Appending a `Value` dispatches on its
//! runtime type-id, so the enum is the host-side half of the type registry.

use std::fmt;

use crate::minor_type::MinorType;

/// A dynamically typed host value.
///
/// Timestamps and durations are carried as raw milliseconds; the engine
/// never interprets calendar semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Long(i64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    /// Milliseconds of elapsed time.
    Duration(i64),
    Keyword(String),
}

macro_rules! impl_from_for_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value!(Long, i16, i32, i64);
impl_from_for_value!(Double, f32, f64);
impl_from_for_value!(Bool, bool);
impl_from_for_value!(Byte, i8);
impl_from_for_value!(Str, String);
impl_from_for_value!(Bytes, Vec<u8>);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl Value {
    /// The minor type this value appends as.
    #[inline]
    pub fn minor_type(&self) -> MinorType {
        match self {
            Value::Null => MinorType::Null,
            Value::Bool(_) => MinorType::Bit,
            Value::Byte(_) => MinorType::Tinyint,
            Value::Long(_) => MinorType::Bigint,
            Value::Double(_) => MinorType::Float8,
            Value::Str(_) => MinorType::Varchar,
            Value::Bytes(_) => MinorType::Varbinary,
            Value::Date(_) => MinorType::TimestampMilli,
            Value::Duration(_) => MinorType::Duration,
            Value::Keyword(_) => MinorType::Keyword,
        }
    }

    /// Stable type-id of this value, as used by the append dispatch table.
    #[inline]
    pub fn type_id(&self) -> i8 {
        self.minor_type().type_id()
    }

    /// Rendered class name, used in error reporting.
    pub fn class_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Duration(_) => "duration",
            Value::Keyword(_) => "keyword",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Byte(b) => write!(f, "{b}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Bytes(b) => write!(f, "0x{}", hex(b)),
            Value::Date(ms) => write!(f, "DATE_MS {ms}"),
            Value::Duration(ms) => write!(f, "DURATION_MS {ms}"),
            Value::Keyword(s) => write!(f, ":{s}"),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
