//! Budgeted buffer allocator.
//!
//! Every vector allocation in the runtime is charged against a caller
//! supplied [`BufferAllocator`]; there is no process-wide default. The
//! allocator is a shared ledger, not a malloc replacement: Arrow owns the
//! actual buffers, while the allocator enforces an engine-level budget and
//! surfaces exhaustion as a recoverable error instead of aborting.

pub mod allocator;

pub use allocator::{BufferAllocator, Reservation};
