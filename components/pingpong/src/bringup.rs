//! Bring-up wiring - pool, channels, tasks, in that order
//!
//! Mirrors what the target's application-define hook does: carve channel
//! storage and task stacks out of one fixed byte pool, create the two
//! channels, then create the two auto-started tasks bound to them in
//! opposite directions. Task B primes the cycle.
//!
//! Any failure here is fatal for the whole system and happens before any
//! task is created; there is nothing to unwind.

use std::sync::Arc;
use std::thread;

use relay_channel::{channel, Message};
use relay_platform::{spawn, Priority, SpawnError, TaskConfig, TaskHandle, TimeSlice};
use relay_pool::{BytePool, PoolError};
use thiserror::Error;

use crate::peer::{Peer, PeerStats};

/// Whole memory budget for channel storage and task stacks
pub const POOL_SIZE: usize = 1024;

/// Pending-message slots per channel. Slack only: the alternating
/// protocol keeps at most one message in flight per channel.
pub const QUEUE_CAPACITY: usize = 10;

/// Stack reservation per task
pub const TASK_STACK_SIZE: usize = 400;

/// Task A outranks task B (lower numeric value), though the protocol
/// must not depend on it.
pub const PRIORITY_A: Priority = Priority(8);
pub const PRIORITY_B: Priority = Priority(16);

/// Error types for bring-up
#[derive(Debug, Error)]
pub enum BringUpError {
    /// Pool could not cover a channel or stack reservation
    #[error("bring-up allocation failed: {0}")]
    Allocation(#[from] PoolError),

    /// Task creation failed
    #[error("bring-up task creation failed: {0}")]
    Spawn(#[from] SpawnError),
}

/// Bring-up knobs, defaulted to the demo configuration
#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    pub pool_size: usize,
    pub queue_capacity: usize,
    pub stack_size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            pool_size: POOL_SIZE,
            queue_capacity: QUEUE_CAPACITY,
            stack_size: TASK_STACK_SIZE,
        }
    }
}

/// A running exchange: two tasks plus observation mirrors
pub struct Demo {
    pub task_a: TaskHandle,
    pub task_b: TaskHandle,
    pub stats_a: Arc<PeerStats>,
    pub stats_b: Arc<PeerStats>,
}

/// Create the pool, both channels, and both tasks; prime the cycle
///
/// Channel 1 carries B -> A traffic, channel 2 carries A -> B. Task B
/// performs the single priming send before entering its loop.
///
/// # Errors
/// Fails before any task is created if the pool cannot cover the channel
/// storage or the stacks, or if the platform rejects a task.
pub fn bring_up(config: DemoConfig) -> Result<Demo, BringUpError> {
    let mut pool = BytePool::new("demo pool", config.pool_size);

    let (tx1, rx1) = channel::<Message>(&mut pool, config.queue_capacity)?;
    let (tx2, rx2) = channel::<Message>(&mut pool, config.queue_capacity)?;
    log::debug!(
        "created 2 channels: capacity {}, pool {}/{} bytes used",
        config.queue_capacity,
        pool.used(),
        pool.capacity()
    );

    // Reserve both stacks before creating either task, so an exhausted
    // pool can never leave one task running alone.
    let stack_a = pool.reserve(config.stack_size)?;
    let stack_b = pool.reserve(config.stack_size)?;

    let stats_a = Arc::new(PeerStats::default());
    let stats_b = Arc::new(PeerStats::default());

    let mut peer_a = Peer::new("task_a", rx1, tx2, stats_a.clone());
    let mut peer_b = Peer::new("task_b", rx2, tx1, stats_b.clone());

    let task_a = spawn(
        TaskConfig {
            name: "task_a",
            priority: PRIORITY_A,
            stack: stack_a,
            time_slice: TimeSlice::None,
            auto_start: true,
        },
        move || halt_on(peer_a.run(), peer_a.name()),
    )?;

    let task_b = spawn(
        TaskConfig {
            name: "task_b",
            priority: PRIORITY_B,
            stack: stack_b,
            time_slice: TimeSlice::None,
            auto_start: true,
        },
        move || {
            let fault = match peer_b.prime() {
                Ok(()) => peer_b.run(),
                Err(fault) => fault,
            };
            halt_on(fault, peer_b.name());
        },
    )?;

    log::info!(
        "bring-up complete: 2 channels (capacity {}), 2 tasks, {} of {} pool bytes reserved",
        config.queue_capacity,
        pool.used(),
        pool.capacity()
    );

    Ok(Demo {
        task_a,
        task_b,
        stats_a,
        stats_b,
    })
}

/// Terminal halt: log the fault and park forever, preserving peer state
/// for inspection. No retry, no cleanup.
fn halt_on(fault: crate::peer::Fault, name: &str) {
    log::error!("[{name}] fatal fault, task halted: {fault}");
    loop {
        thread::park();
    }
}
