//! Byte Pool - Fixed-size arena bookkeeping for bring-up allocations
//!
//! # Purpose
//! Models the static memory pool an embedded target carves task stacks
//! and channel storage out of. Reservations are made once at bring-up;
//! the pool never grows, never shrinks, and never frees (bump discipline).
//!
//! # Integration Points
//! - Depends on: nothing (core only)
//! - Provides to: channel creation (backing store) and task spawn (stacks)
//!
//! # Architecture
//! Pure offset bookkeeping: `reserve` hands out non-overlapping `Region`
//! descriptors inside a fixed byte budget. The pool does not own real
//! memory on the host; the budget and exhaustion behavior are what the
//! core depends on.

#![no_std]

use thiserror::Error;

/// Error types for pool operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Arena cannot cover the request
    #[error("pool exhausted (requested {requested} bytes, {available} available)")]
    Exhausted { requested: usize, available: usize },

    /// Alignment must be a power of two
    #[error("invalid alignment: {align}")]
    BadAlign { align: usize },
}

pub type Result<T> = core::result::Result<T, PoolError>;

/// One reservation inside a pool
///
/// Regions never overlap and stay valid for the life of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    offset: usize,
    size: usize,
}

impl Region {
    /// Offset of the region from the pool base
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the region in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Fixed-size byte pool
///
/// Created once at bring-up with the whole memory budget. Reserve-only:
/// a failed reservation leaves the pool unchanged, and nothing is ever
/// returned to it during normal operation.
pub struct BytePool {
    name: &'static str,
    size: usize,
    next: usize,
}

impl BytePool {
    /// Create an empty pool covering `size` bytes
    pub const fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            size,
            next: 0,
        }
    }

    /// Pool name (for diagnostics)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Total pool size in bytes
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Bytes handed out so far (including alignment padding)
    pub fn used(&self) -> usize {
        self.next
    }

    /// Bytes still available
    pub fn available(&self) -> usize {
        self.size - self.next
    }

    /// Reserve `size` bytes with no alignment requirement
    pub fn reserve(&mut self, size: usize) -> Result<Region> {
        self.reserve_aligned(size, 1)
    }

    /// Reserve `size` bytes aligned to `align`
    ///
    /// # Errors
    /// `BadAlign` if `align` is not a power of two; `Exhausted` if the
    /// remaining budget cannot cover the aligned request. On error the
    /// pool state is unchanged.
    pub fn reserve_aligned(&mut self, size: usize, align: usize) -> Result<Region> {
        if !align.is_power_of_two() {
            return Err(PoolError::BadAlign { align });
        }

        // Align the cursor up, then check the budget
        let start = (self.next + align - 1) & !(align - 1);
        let end = match start.checked_add(size) {
            Some(end) if end <= self.size => end,
            _ => {
                return Err(PoolError::Exhausted {
                    requested: size,
                    available: self.size.saturating_sub(start.min(self.size)),
                })
            }
        };

        self.next = end;
        Ok(Region {
            offset: start,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_sequential_and_disjoint() {
        let mut pool = BytePool::new("test", 1024);
        let a = pool.reserve(400).unwrap();
        let b = pool.reserve(400).unwrap();

        assert_eq!(a.offset(), 0);
        assert_eq!(a.size(), 400);
        assert_eq!(b.offset(), 400);
        assert_eq!(pool.used(), 800);
        assert_eq!(pool.available(), 224);
    }

    #[test]
    fn exhaustion_leaves_pool_unchanged() {
        let mut pool = BytePool::new("test", 100);
        pool.reserve(60).unwrap();

        let err = pool.reserve(60).unwrap_err();
        assert_eq!(
            err,
            PoolError::Exhausted {
                requested: 60,
                available: 40
            }
        );

        // Failed reserve must not consume budget
        assert_eq!(pool.used(), 60);
        pool.reserve(40).unwrap();
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn aligned_reserve_pads_the_cursor() {
        let mut pool = BytePool::new("test", 64);
        pool.reserve(3).unwrap();

        let r = pool.reserve_aligned(8, 8).unwrap();
        assert_eq!(r.offset(), 8);
        assert_eq!(pool.used(), 16);
    }

    #[test]
    fn alignment_must_be_power_of_two() {
        let mut pool = BytePool::new("test", 64);
        assert_eq!(
            pool.reserve_aligned(8, 3),
            Err(PoolError::BadAlign { align: 3 })
        );
    }

    #[test]
    fn zero_sized_pool_rejects_everything() {
        let mut pool = BytePool::new("empty", 0);
        assert!(matches!(
            pool.reserve(1),
            Err(PoolError::Exhausted { .. })
        ));
    }

    #[test]
    fn accounting_invariant_holds() {
        let mut pool = BytePool::new("test", 1024);
        for _ in 0..4 {
            pool.reserve(100).unwrap();
            assert_eq!(pool.used() + pool.available(), pool.capacity());
        }
    }
}
