//! Reservation-based memory accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempora_result::{Error, Result};

#[derive(Debug)]
struct Ledger {
    limit: usize,
    in_use: AtomicUsize,
}

impl Ledger {
    fn charge(&self, bytes: usize) -> Result<()> {
        let mut current = self.in_use.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(bytes);
            if next > self.limit {
                return Err(Error::AllocationFailed {
                    requested: bytes,
                    in_use: current,
                    limit: self.limit,
                });
            }
            match self.in_use.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    fn refund(&self, bytes: usize) {
        self.in_use.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Shared memory budget for vector allocations.
///
/// Cloning an allocator clones a handle to the same ledger, so a relation
/// and the columns it spawns draw from one budget. Accounting is atomic;
/// handing clones to multiple threads is safe even though the structures
/// charged against the budget may themselves be single-producer.
#[derive(Clone)]
pub struct BufferAllocator {
    ledger: Arc<Ledger>,
}

impl BufferAllocator {
    /// An allocator enforcing `limit_bytes` across all reservations.
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            ledger: Arc::new(Ledger {
                limit: limit_bytes,
                in_use: AtomicUsize::new(0),
            }),
        }
    }

    /// An allocator with no effective limit. Reservations still track
    /// usage so [`BufferAllocator::allocated_bytes`] stays meaningful.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// Reserve `bytes` against the budget.
    ///
    /// Fails with [`Error::AllocationFailed`] when the budget would be
    /// exceeded; the ledger is left unchanged in that case.
    pub fn reserve(&self, bytes: usize) -> Result<Reservation> {
        self.ledger.charge(bytes)?;
        Ok(Reservation {
            ledger: Arc::clone(&self.ledger),
            bytes,
        })
    }

    /// Bytes currently reserved across all live reservations.
    pub fn allocated_bytes(&self) -> usize {
        self.ledger.in_use.load(Ordering::Acquire)
    }

    /// The configured budget.
    pub fn limit_bytes(&self) -> usize {
        self.ledger.limit
    }
}

impl std::fmt::Debug for BufferAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferAllocator")
            .field("limit", &self.ledger.limit)
            .field("in_use", &self.allocated_bytes())
            .finish()
    }
}

/// A slice of the budget held by one owner.
///
/// Dropping the reservation refunds its bytes; [`Reservation::release`] does
/// the same eagerly and is idempotent, so double-release is a no-op.
#[derive(Debug)]
pub struct Reservation {
    ledger: Arc<Ledger>,
    bytes: usize,
}

impl Reservation {
    /// Grow this reservation by `additional` bytes.
    pub fn grow(&mut self, additional: usize) -> Result<()> {
        self.ledger.charge(additional)?;
        self.bytes += additional;
        Ok(())
    }

    /// Bytes currently held.
    pub fn size(&self) -> usize {
        self.bytes
    }

    /// Refund the held bytes now instead of at drop.
    pub fn release(&mut self) {
        if self.bytes > 0 {
            self.ledger.refund(self.bytes);
            self.bytes = 0;
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_and_release_round_trip() -> Result<()> {
        let alloc = BufferAllocator::new(1024);
        let mut r = alloc.reserve(512)?;
        assert_eq!(alloc.allocated_bytes(), 512);
        r.grow(256)?;
        assert_eq!(alloc.allocated_bytes(), 768);
        r.release();
        assert_eq!(alloc.allocated_bytes(), 0);
        // Idempotent.
        r.release();
        assert_eq!(alloc.allocated_bytes(), 0);
        Ok(())
    }

    #[test]
    fn exhaustion_is_recoverable() {
        let alloc = BufferAllocator::new(100);
        let held = alloc.reserve(80).unwrap();
        let err = alloc.reserve(40).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { requested: 40, .. }));
        drop(held);
        // Budget returned; the retry succeeds.
        assert!(alloc.reserve(40).is_ok());
    }

    #[test]
    fn drop_refunds() {
        let alloc = BufferAllocator::new(64);
        {
            let _r = alloc.reserve(64).unwrap();
            assert_eq!(alloc.allocated_bytes(), 64);
        }
        assert_eq!(alloc.allocated_bytes(), 0);
    }
}
