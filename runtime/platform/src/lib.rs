//! # Platform Abstraction Layer
//!
//! The contract the relay core consumes from its host kernel: task
//! creation and notification objects. The kernel itself (scheduler,
//! priority algorithm, real memory pool) is an external collaborator and
//! is NOT implemented here.
//!
//! ## Host Backend
//!
//! This crate ships a host backend that stands in for the real kernel
//! during development and testing:
//! - Tasks are named OS threads.
//! - Notifications are condvar-backed signal words.
//! - Priority and time slice are recorded and logged, never enforced.
//!   The core's correctness must not depend on them; only the blocking
//!   channel semantics matter.
//!
//! On a real target this crate is replaced by bindings to the host
//! kernel's task and signaling primitives; the types below are the
//! surface the rest of the tree programs against.

mod notify;
mod task;

pub use notify::{Notification, SignalBits};
pub use task::{spawn, Priority, SpawnError, TaskConfig, TaskHandle, TimeSlice};

/// Which backend is active
///
/// Only the host backend exists in this tree; the function mirrors the
/// shape a dual-mode build would have.
pub const fn backend() -> &'static str {
    "host"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_host() {
        assert_eq!(backend(), "host");
    }
}
