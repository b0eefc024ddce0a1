//! Lock-free SPSC slot ring
//!
//! Atomic head/tail indices over a fixed slot array. One slot is kept
//! spare to distinguish full from empty, so a ring built for capacity
//! `c` owns `c + 1` slots. Producer touches only `head`, consumer only
//! `tail`; Acquire/Release ordering makes the slot write visible before
//! the index that publishes it.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

pub(crate) struct SlotRing<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Producer writes here
    head: AtomicUsize,
    /// Consumer reads here
    tail: AtomicUsize,
}

// Single producer and single consumer never touch the same slot while
// it is live; the endpoints enforce that discipline.
unsafe impl<T: Send> Sync for SlotRing<T> {}
unsafe impl<T: Send> Send for SlotRing<T> {}

impl<T: Copy> SlotRing<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "ring capacity must be at least 1");

        let slots = (0..capacity + 1)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Self {
            slots,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Enqueue at the tail end of the FIFO (producer side)
    ///
    /// Returns false if the ring is full.
    pub(crate) fn push(&self, value: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next = (head + 1) % self.slots.len();

        if next == tail {
            return false;
        }

        unsafe {
            (*self.slots[head].get()).write(value);
        }
        self.head.store(next, Ordering::Release);
        true
    }

    /// Dequeue from the head of the FIFO (consumer side)
    ///
    /// Returns None if the ring is empty.
    pub(crate) fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let value = unsafe { (*self.slots[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) % self.slots.len(), Ordering::Release);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        let n = self.slots.len();

        if head >= tail {
            head - tail
        } else {
            n - tail + head
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub(crate) fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + 1) % self.slots.len() == tail
    }
}
