//! Notification objects - lightweight signaling between tasks
//!
//! A notification carries a word of signal bits. Signaling ORs bits in
//! and wakes any waiter; waiting blocks until at least one bit is
//! pending, then takes the whole word. Bits are sticky until consumed,
//! so a signal delivered before the peer starts waiting is never lost.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use bitflags::bitflags;

bitflags! {
    /// Signal bits carried by a notification
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SignalBits: u64 {
        /// A message was enqueued
        const DATA_READY = 1;
        /// A slot was freed
        const SPACE_AVAIL = 2;
    }
}

/// Cloneable notification handle
///
/// Clones refer to the same underlying signal word, so one side can
/// signal while the other waits.
#[derive(Clone)]
pub struct Notification {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<SignalBits>,
    waiters: Condvar,
}

impl Notification {
    /// Create a notification with no pending signals
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(SignalBits::empty()),
                waiters: Condvar::new(),
            }),
        }
    }

    fn pending(&self) -> MutexGuard<'_, SignalBits> {
        // A poisoned lock only means a peer task panicked mid-signal;
        // the signal word itself is still coherent.
        match self.inner.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// OR `bits` into the pending word and wake any waiter
    pub fn signal(&self, bits: SignalBits) {
        let mut pending = self.pending();
        *pending |= bits;
        self.inner.waiters.notify_all();
    }

    /// Block until at least one signal bit is pending, then take all bits
    ///
    /// WaitForever semantics: there is no timeout variant.
    pub fn wait(&self) -> SignalBits {
        let mut pending = self.pending();
        while pending.is_empty() {
            pending = match self.inner.waiters.wait(pending) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        std::mem::replace(&mut *pending, SignalBits::empty())
    }

    /// Take any pending bits without blocking
    pub fn poll(&self) -> SignalBits {
        let mut pending = self.pending();
        std::mem::replace(&mut *pending, SignalBits::empty())
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn poll_returns_empty_when_idle() {
        let n = Notification::new();
        assert_eq!(n.poll(), SignalBits::empty());
    }

    #[test]
    fn signal_before_wait_is_not_lost() {
        let n = Notification::new();
        n.signal(SignalBits::DATA_READY);
        assert_eq!(n.wait(), SignalBits::DATA_READY);
    }

    #[test]
    fn signals_accumulate_until_taken() {
        let n = Notification::new();
        n.signal(SignalBits::DATA_READY);
        n.signal(SignalBits::SPACE_AVAIL);
        assert_eq!(n.poll(), SignalBits::DATA_READY | SignalBits::SPACE_AVAIL);
        assert_eq!(n.poll(), SignalBits::empty());
    }

    #[test]
    fn wait_blocks_until_peer_signals() {
        let n = Notification::new();
        let peer = n.clone();

        let waiter = thread::spawn(move || peer.wait());
        thread::sleep(std::time::Duration::from_millis(20));
        n.signal(SignalBits::SPACE_AVAIL);

        assert_eq!(waiter.join().unwrap(), SignalBits::SPACE_AVAIL);
    }
}
