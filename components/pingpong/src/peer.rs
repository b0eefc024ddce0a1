//! Peer task - one side of the ping-pong exchange
//!
//! Both peers run the same loop: receive from the inbound channel,
//! validate the payload against the expected sequence value, increment,
//! send on the outbound channel. The peers differ only in that exactly
//! one of them (task B) primes the cycle with a single unconditional
//! send before entering the loop; without it both sides would wait
//! forever on their inbound channels.
//!
//! Every fault is terminal. There is no retry, no recovery, no backoff:
//! a sequence violation or channel fault ends the loop with the fault
//! value, and the caller decides how to halt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_channel::{ChannelError, Message, Receiver, Sender, WaitPolicy};
use thiserror::Error;

/// Terminal protocol faults
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Received value does not match the expected sequence counter
    #[error("sequence violation: expected {expected}, got {got}")]
    Sequence { expected: Message, got: Message },

    /// A channel primitive failed
    #[error("channel fault: {0}")]
    Channel(#[from] ChannelError),
}

/// Read-only mirror of one peer's counters
///
/// The peer owns its counters exclusively; this mirror exists so the
/// demo binary and tests can observe progress without touching peer
/// state. Observation only, never a cross-task mutation path.
#[derive(Debug, Default)]
pub struct PeerStats {
    sent: AtomicU64,
    received: AtomicU64,
    cycles: AtomicU64,
}

impl PeerStats {
    /// (sent, received, cycles) as last published by the peer
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.sent.load(Ordering::Acquire),
            self.received.load(Ordering::Acquire),
            self.cycles.load(Ordering::Acquire),
        )
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Acquire)
    }
}

/// One peer of the exchange
///
/// Owns its inbound/outbound endpoints and its counters. `received` is
/// both a count of accepted messages and the expected value of the next
/// inbound message; the protocol keeps the two meanings identical.
pub struct Peer {
    name: &'static str,
    rx: Receiver<Message>,
    tx: Sender<Message>,
    sent: Message,
    received: Message,
    cycles: u64,
    stats: Arc<PeerStats>,
}

impl Peer {
    pub fn new(
        name: &'static str,
        rx: Receiver<Message>,
        tx: Sender<Message>,
        stats: Arc<PeerStats>,
    ) -> Self {
        Self {
            name,
            rx,
            tx,
            sent: 0,
            received: 0,
            cycles: 0,
            stats,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Messages sent so far (also the next value to send)
    pub fn sent(&self) -> Message {
        self.sent
    }

    /// Messages accepted so far (also the next expected inbound value)
    pub fn received(&self) -> Message {
        self.received
    }

    /// Completed receive-validate-send cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Seed the cycle with one unconditional send
    ///
    /// Called once, before the loop, by the single priming peer.
    pub fn prime(&mut self) -> Result<(), Fault> {
        self.tx.send(self.sent, WaitPolicy::Forever)?;
        self.sent = self.sent.wrapping_add(1);
        self.publish();
        Ok(())
    }

    /// One receive-validate-send cycle
    ///
    /// On a sequence violation the counters are untouched and nothing is
    /// sent; the fault is final.
    pub fn step(&mut self) -> Result<(), Fault> {
        let got = self.rx.receive(WaitPolicy::Forever)?;
        if got != self.received {
            return Err(Fault::Sequence {
                expected: self.received,
                got,
            });
        }

        self.received = self.received.wrapping_add(1);
        self.cycles += 1;

        self.tx.send(self.sent, WaitPolicy::Forever)?;
        self.sent = self.sent.wrapping_add(1);

        self.publish();
        Ok(())
    }

    /// Run the exchange loop until a fault ends it
    ///
    /// There is no normal termination; the return value is the terminal
    /// fault state.
    pub fn run(&mut self) -> Fault {
        loop {
            if let Err(fault) = self.step() {
                return fault;
            }
        }
    }

    fn publish(&self) {
        self.stats.sent.store(self.sent as u64, Ordering::Release);
        self.stats
            .received
            .store(self.received as u64, Ordering::Release);
        self.stats.cycles.store(self.cycles, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_channel::channel;
    use relay_pool::BytePool;

    /// Wire two peers the way bring-up does: channel 1 carries B -> A,
    /// channel 2 carries A -> B.
    fn wired_peers() -> (Peer, Peer) {
        let mut pool = BytePool::new("test", 1024);
        let (tx1, rx1) = channel::<Message>(&mut pool, 10).unwrap();
        let (tx2, rx2) = channel::<Message>(&mut pool, 10).unwrap();

        let a = Peer::new("task_a", rx1, tx2, Arc::new(PeerStats::default()));
        let b = Peer::new("task_b", rx2, tx1, Arc::new(PeerStats::default()));
        (a, b)
    }

    #[test]
    fn priming_sends_zero_and_increments() {
        let (a, mut b) = wired_peers();
        b.prime().unwrap();

        assert_eq!(b.sent(), 1);
        assert_eq!(b.received(), 0);
        // The priming message sits on A's inbound channel
        assert_eq!(a.rx.len(), 1);
    }

    #[test]
    fn alternating_steps_stay_in_lock_step() {
        let (mut a, mut b) = wired_peers();
        b.prime().unwrap();

        for i in 0..100u32 {
            a.step().unwrap();
            assert_eq!(a.received(), i + 1);
            assert_eq!(a.sent(), i + 1);
            // A is at most one cycle ahead of B
            assert!(a.received() - b.received() <= 1);

            b.step().unwrap();
            assert_eq!(b.received(), i + 1);
            // prime() already advanced B's sent counter once
            assert_eq!(b.sent(), i + 2);
        }

        assert_eq!(a.cycles(), 100);
        assert_eq!(b.cycles(), 100);
    }

    #[test]
    fn stats_mirror_follows_counters() {
        let (mut a, mut b) = wired_peers();
        let stats = a.stats.clone();

        b.prime().unwrap();
        a.step().unwrap();
        b.step().unwrap();
        a.step().unwrap();

        assert_eq!(stats.snapshot(), (2, 2, 2));
    }

    #[test]
    fn unexpected_value_is_a_terminal_sequence_fault() {
        let mut pool = BytePool::new("test", 1024);
        let (inject, inbound) = channel::<Message>(&mut pool, 10).unwrap();
        let (outbound, observe) = channel::<Message>(&mut pool, 10).unwrap();
        let mut a = Peer::new("task_a", inbound, outbound, Arc::new(PeerStats::default()));

        // Inject 5 when the peer expects 0
        inject.send(5, WaitPolicy::NoWait).unwrap();

        assert_eq!(
            a.step(),
            Err(Fault::Sequence {
                expected: 0,
                got: 5
            })
        );
        // Counters untouched, nothing sent
        assert_eq!(a.received(), 0);
        assert_eq!(a.sent(), 0);
        assert_eq!(observe.receive(WaitPolicy::NoWait), Err(ChannelError::Empty));
    }

    #[test]
    fn dropped_inbound_sender_is_a_channel_fault() {
        let (mut a, b) = wired_peers();
        drop(b);

        assert_eq!(
            a.step(),
            Err(Fault::Channel(ChannelError::Disconnected))
        );
    }

    #[test]
    fn step_returns_unit_result_for_question_mark_chaining() {
        fn drive(peer: &mut Peer, steps: u32) -> Result<(), Fault> {
            for _ in 0..steps {
                peer.step()?;
            }
            Ok(())
        }

        let (mut a, mut b) = wired_peers();
        b.prime().unwrap();
        for _ in 0..10 {
            drive(&mut a, 1).unwrap();
            drive(&mut b, 1).unwrap();
        }
        assert_eq!(a.cycles(), 10);
    }
}
