use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all Tempora operations.
///
/// This enum encompasses the failure modes of the columnar relation layer
/// and the grid index, from allocator exhaustion to malformed append input.
/// Each variant carries the context needed to diagnose the failure without
/// re-running the operation.
///
/// # Error Handling Strategy
///
/// Errors propagate upward through the call stack using Rust's `?` operator.
/// Internal code can match on specific variants for fine-grained handling;
/// only [`Error::AllocationFailed`] is expected to be handled (e.g. by
/// spilling) rather than surfaced.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file or buffer operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error during columnar data operations.
    ///
    /// Arrow is the underlying columnar memory format used by Tempora, so
    /// these errors typically indicate data format incompatibilities during
    /// batch construction or array downcasts.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A value was appended whose runtime type has no entry in the type-id
    /// dispatch table.
    ///
    /// Carries the rendered class of the offending value and the Arrow type
    /// computed for it, so the caller can see exactly what was rejected.
    /// Non-recoverable at the call site.
    #[error("unsupported value type: {class} (arrow type {arrow_type})")]
    UnsupportedValueType { class: String, arrow_type: String },

    /// The requested operation is not defined for this structure.
    ///
    /// The grid index is sealed after build; `insert` and `delete` fail with
    /// this variant, as do appends outside an append column's write contract.
    #[error("operation not supported: {0}")]
    OperationNotSupported(&'static str),

    /// The buffer allocator could not satisfy a reservation.
    ///
    /// Recoverable by the operator layer (e.g. by spilling) but propagated
    /// by the core unchanged.
    #[error("allocation of {requested} bytes failed ({in_use} in use, limit {limit})")]
    AllocationFailed {
        requested: usize,
        in_use: usize,
        limit: usize,
    },

    /// Columns of an append relation disagree on their value counts.
    ///
    /// `read()` relies on all columns sharing one row count; observing
    /// anything else is fatal for the relation.
    #[error("column {column} has {actual} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Invalid user input or API parameter.
    ///
    /// Covers bad grid arity, non-power-of-two cell sizes, arity mismatches
    /// between a point source and a builder, and similar caller mistakes.
    /// Typically recoverable: fix the input and retry.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never occur during normal operation; it indicates a
    /// violated internal invariant rather than bad input.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::UnsupportedValueType`] from a displayable class
    /// name and arrow type descriptor.
    #[inline]
    pub fn unsupported_value<C: fmt::Display, A: fmt::Display>(class: C, arrow_type: A) -> Self {
        Error::UnsupportedValueType {
            class: class.to_string(),
            arrow_type: arrow_type.to_string(),
        }
    }
}
