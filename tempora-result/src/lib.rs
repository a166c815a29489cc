//! Error types and result definitions for the Tempora columnar runtime.
//!
//! This crate provides the unified error type ([`Error`]) and result type
//! alias ([`Result<T>`]) used throughout all Tempora crates. All operations
//! that can fail return `Result<T>`, where the error variant carries the
//! offending input so callers can fail fast with context.
//!
//! # Error Philosophy
//!
//! Tempora uses a single error enum ([`Error`]) rather than crate-specific
//! error types. This approach:
//! - Simplifies error handling across crate boundaries
//! - Allows errors to propagate naturally with the `?` operator
//! - Enables structured error matching for programmatic handling
//!
//! The core never retries. Recoverable conditions (e.g.
//! [`Error::AllocationFailed`]) are propagated unchanged so the operator
//! layer can decide what to do; resource cleanup is unconditional either way.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
