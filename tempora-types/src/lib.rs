//! Common data types for the Tempora columnar runtime.
//!
//! This crate hosts the closed minor-type enumeration and the canonical host
//! value used throughout the system, decoupled from the relation layer
//! (`tempora-relation`) and the grid index (`tempora-grid`).

pub mod minor_type;
pub mod value;

pub use minor_type::MinorType;
pub use value::Value;
