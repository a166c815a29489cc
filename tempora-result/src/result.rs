use crate::error::Error;

/// Result type alias used throughout Tempora.
///
/// This is a type alias for `std::result::Result<T, Error>`, providing a
/// convenient shorthand for functions that return Tempora errors. All
/// Tempora operations that can fail should return this type.
pub type Result<T> = std::result::Result<T, Error>;
