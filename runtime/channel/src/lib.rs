//! Bounded Channel - blocking FIFO message transport between two tasks
//!
//! # Purpose
//! The only shared-mutation surface in the relay core: a fixed-capacity
//! FIFO carrying one fixed-width scalar per message between exactly one
//! sender task and one receiver task.
//!
//! # Integration Points
//! - Depends on: relay-pool (backing-store budget), relay-platform
//!   (notifications for blocking)
//! - Provides to: peer task loops
//!
//! # Architecture
//! A lock-free SPSC slot ring does the data movement; blocking is
//! layered on top with sticky notifications. `send` signals DATA_READY
//! after every enqueue, `receive` signals SPACE_AVAIL after every
//! dequeue, and under `WaitPolicy::Forever` a full/empty ring parks the
//! caller on the opposite notification and retries. Those two calls are
//! the only suspension points the core has.
//!
//! Channels are created once at bring-up with a fixed capacity and are
//! never resized. Dropping either endpoint is the fault case: the
//! surviving peer observes `ChannelError::Disconnected`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use relay_platform::{Notification, SignalBits};
use relay_pool::{BytePool, PoolError};
use static_assertions::{assert_impl_all, const_assert_eq};
use thiserror::Error;

mod ring;

use ring::SlotRing;

/// The one message shape this core exchanges: an unsigned sequence value
pub type Message = u32;

const_assert_eq!(core::mem::size_of::<Message>(), 4);

/// Error types for channel operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// No free slot (NoWait only)
    #[error("channel full (capacity {capacity})")]
    Full { capacity: usize },

    /// No pending message (NoWait only)
    #[error("channel empty")]
    Empty,

    /// Peer endpoint is gone; the channel can never make progress again
    #[error("channel disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, ChannelError>;

/// Blocking policy for send/receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Suspend until the operation can complete; no timeout
    #[default]
    Forever,
    /// Fail immediately with `Full`/`Empty`
    NoWait,
}

struct Shared<T> {
    ring: SlotRing<T>,
    /// Signaled by the sender after every enqueue
    data_ready: Notification,
    /// Signaled by the receiver after every dequeue
    space_avail: Notification,
    sender_alive: AtomicBool,
    receiver_alive: AtomicBool,
}

/// Producing endpoint; exactly one per channel
pub struct Sender<T: Copy> {
    shared: Arc<Shared<T>>,
}

/// Consuming endpoint; exactly one per channel
pub struct Receiver<T: Copy> {
    shared: Arc<Shared<T>>,
}

assert_impl_all!(Sender<Message>: Send);
assert_impl_all!(Receiver<Message>: Send);

/// Create a bounded channel with `capacity` message slots
///
/// Reserves the backing store (`capacity * message width`) from the
/// bring-up pool first; creation fails only if that reservation fails.
pub fn channel<T: Copy + Send>(
    pool: &mut BytePool,
    capacity: usize,
) -> std::result::Result<(Sender<T>, Receiver<T>), PoolError> {
    let width = core::mem::size_of::<T>();
    pool.reserve_aligned(capacity * width, core::mem::align_of::<T>())?;

    let shared = Arc::new(Shared {
        ring: SlotRing::new(capacity),
        data_ready: Notification::new(),
        space_avail: Notification::new(),
        sender_alive: AtomicBool::new(true),
        receiver_alive: AtomicBool::new(true),
    });

    Ok((
        Sender {
            shared: shared.clone(),
        },
        Receiver { shared },
    ))
}

impl<T: Copy> Sender<T> {
    /// Enqueue `value` at the tail
    ///
    /// Under `Forever`, suspends while the channel is full and retries
    /// when the receiver frees a slot. Wakes the receiver after every
    /// successful enqueue.
    ///
    /// # Errors
    /// `Full` under `NoWait`; `Disconnected` if the receiver endpoint
    /// has been dropped.
    pub fn send(&self, value: T, wait: WaitPolicy) -> Result<()> {
        loop {
            if !self.shared.receiver_alive.load(Ordering::Acquire) {
                return Err(ChannelError::Disconnected);
            }

            if self.shared.ring.push(value) {
                self.shared.data_ready.signal(SignalBits::DATA_READY);
                return Ok(());
            }

            match wait {
                WaitPolicy::NoWait => {
                    return Err(ChannelError::Full {
                        capacity: self.shared.ring.capacity(),
                    })
                }
                WaitPolicy::Forever => {
                    self.shared.space_avail.wait();
                }
            }
        }
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    /// Message slots this channel was created with
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }
}

impl<T: Copy> Receiver<T> {
    /// Dequeue the message at the head
    ///
    /// Under `Forever`, suspends while the channel is empty and retries
    /// when the sender enqueues. Wakes the sender after every successful
    /// dequeue.
    ///
    /// # Errors
    /// `Empty` under `NoWait`; `Disconnected` once the channel is
    /// drained and the sender endpoint has been dropped. Pending
    /// messages are always delivered before the disconnect is reported.
    pub fn receive(&self, wait: WaitPolicy) -> Result<T> {
        loop {
            if let Some(value) = self.shared.ring.pop() {
                self.shared.space_avail.signal(SignalBits::SPACE_AVAIL);
                return Ok(value);
            }

            if !self.shared.sender_alive.load(Ordering::Acquire) {
                return Err(ChannelError::Disconnected);
            }

            match wait {
                WaitPolicy::NoWait => return Err(ChannelError::Empty),
                WaitPolicy::Forever => {
                    self.shared.data_ready.wait();
                }
            }
        }
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.ring.is_full()
    }

    /// Message slots this channel was created with
    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }
}

impl<T: Copy> Drop for Sender<T> {
    fn drop(&mut self) {
        self.shared.sender_alive.store(false, Ordering::Release);
        // Wake a receiver parked on an empty ring so it sees the fault
        self.shared.data_ready.signal(SignalBits::DATA_READY);
    }
}

impl<T: Copy> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.shared.receiver_alive.store(false, Ordering::Release);
        // Wake a sender parked on a full ring so it sees the fault
        self.shared.space_avail.signal(SignalBits::SPACE_AVAIL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(capacity: usize) -> (Sender<Message>, Receiver<Message>) {
        let mut pool = BytePool::new("test", 4096);
        channel(&mut pool, capacity).unwrap()
    }

    #[test]
    fn fifo_order_is_preserved() {
        let (tx, rx) = pair(10);
        for i in 0..10 {
            tx.send(i, WaitPolicy::NoWait).unwrap();
        }
        for i in 0..10 {
            assert_eq!(rx.receive(WaitPolicy::NoWait), Ok(i));
        }
    }

    #[test]
    fn nowait_reports_full_and_empty() {
        let (tx, rx) = pair(2);

        assert_eq!(rx.receive(WaitPolicy::NoWait), Err(ChannelError::Empty));

        tx.send(1, WaitPolicy::NoWait).unwrap();
        tx.send(2, WaitPolicy::NoWait).unwrap();
        assert_eq!(
            tx.send(3, WaitPolicy::NoWait),
            Err(ChannelError::Full { capacity: 2 })
        );
    }

    #[test]
    fn creation_charges_the_pool() {
        let mut pool = BytePool::new("test", 4096);
        let before = pool.available();
        let _pair = channel::<Message>(&mut pool, 10).unwrap();
        assert_eq!(before - pool.available(), 10 * core::mem::size_of::<Message>());
    }

    #[test]
    fn creation_fails_on_exhausted_pool() {
        let mut pool = BytePool::new("tiny", 8);
        assert!(channel::<Message>(&mut pool, 10).is_err());
    }

    #[test]
    fn no_loss_no_duplication_accounting() {
        let (tx, rx) = pair(10);
        let mut sent = 0u32;
        let mut received = 0u32;

        for round in 0..7u32 {
            for _ in 0..=round {
                tx.send(sent, WaitPolicy::NoWait).unwrap();
                sent += 1;
            }
            // Messages in flight plus messages delivered always equals
            // messages sent
            assert_eq!(sent as usize, rx.len() + received as usize);
            while let Ok(v) = rx.receive(WaitPolicy::NoWait) {
                assert_eq!(v, received);
                received += 1;
            }
        }
        assert_eq!(sent, received);
    }

    #[test]
    fn receiver_sees_disconnect_after_drain() {
        let (tx, rx) = pair(4);
        tx.send(7, WaitPolicy::NoWait).unwrap();
        drop(tx);

        // Pending message is still delivered, then the fault surfaces
        assert_eq!(rx.receive(WaitPolicy::Forever), Ok(7));
        assert_eq!(
            rx.receive(WaitPolicy::NoWait),
            Err(ChannelError::Disconnected)
        );
    }

    #[test]
    fn sender_sees_disconnect() {
        let (tx, rx) = pair(4);
        drop(rx);
        assert_eq!(
            tx.send(1, WaitPolicy::Forever),
            Err(ChannelError::Disconnected)
        );
    }

    #[test]
    fn blocked_receiver_wakes_on_sender_drop() {
        let (tx, rx) = pair(4);
        crossbeam::thread::scope(|s| {
            let waiter = s.spawn(|_| rx.receive(WaitPolicy::Forever));
            std::thread::sleep(std::time::Duration::from_millis(20));
            drop(tx);
            assert_eq!(waiter.join().unwrap(), Err(ChannelError::Disconnected));
        })
        .unwrap();
    }

    #[test]
    fn blocking_send_receive_across_threads() {
        // Capacity far below the message count forces both sides through
        // their suspension points.
        let (tx, rx) = pair(4);
        const COUNT: u32 = 1000;

        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for i in 0..COUNT {
                    tx.send(i, WaitPolicy::Forever).unwrap();
                }
            });
            for i in 0..COUNT {
                assert_eq!(rx.receive(WaitPolicy::Forever), Ok(i));
            }
        })
        .unwrap();
    }
}
