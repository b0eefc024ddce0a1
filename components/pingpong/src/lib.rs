//! Ping-Pong Exchange - two peer tasks trading sequence-numbered messages
//!
//! # Purpose
//! The demonstration core: task A and task B exchange one scalar message
//! over two unidirectional bounded channels, each side validating that
//! every received value equals its own received-count before echoing the
//! next value back. The counters on both sides stay in lock step for as
//! long as the system runs.
//!
//! # Integration Points
//! - Depends on: relay-channel (transport), relay-platform (task
//!   creation), relay-pool (memory budget)
//! - Provides to: the demo binary and integration tests
//!
//! # Fault Policy
//! Fail-fast. A sequence violation or channel fault is terminal: the
//! affected task halts in place with its state preserved. There is no
//! recovery path anywhere in this component.

mod bringup;
mod peer;

pub use bringup::{
    bring_up, BringUpError, Demo, DemoConfig, POOL_SIZE, PRIORITY_A, PRIORITY_B, QUEUE_CAPACITY,
    TASK_STACK_SIZE,
};
pub use peer::{Fault, Peer, PeerStats};
