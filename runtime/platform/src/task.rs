//! Task creation - the spawn contract consumed at bring-up
//!
//! Mirrors what an embedded kernel offers: a named task bound to an
//! entry routine, with a priority, a stack reservation, and a time-slice
//! policy, auto-started at creation. The host backend maps each task to
//! an OS thread and leaves scheduling to the host.

use std::thread;

use relay_pool::Region;
use thiserror::Error;

/// Task priority (lower numeric value = higher priority)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u8);

impl Priority {
    /// Highest priority the contract admits
    pub const HIGHEST: Priority = Priority(0);
    /// Default for tasks that don't care
    pub const DEFAULT: Priority = Priority(100);
}

/// Time-slice policy for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlice {
    /// Run until the task blocks (no round-robin preemption)
    None,
    /// Preempt after this many ticks among equal-priority peers
    Ticks(u32),
}

/// Everything the kernel needs to create one task
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    /// Task name (diagnostics, thread name on the host)
    pub name: &'static str,
    /// Scheduling priority
    pub priority: Priority,
    /// Stack reservation from the bring-up pool
    pub stack: Region,
    /// Time-slice policy
    pub time_slice: TimeSlice,
    /// Start immediately on creation
    pub auto_start: bool,
}

/// Error types for task creation
#[derive(Debug, Error)]
pub enum SpawnError {
    /// Host backend cannot hold a task in the created-but-suspended state
    #[error("task {name:?} requested deferred start, host backend only auto-starts")]
    DeferredStart { name: &'static str },

    /// Thread creation failed
    #[error("failed to create task {name:?}: {source}")]
    Create {
        name: &'static str,
        source: std::io::Error,
    },
}

/// Handle to a created task
///
/// Tasks in this system run forever; the handle exists for identity and
/// for tests that need to wait on a finite entry routine.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    thread: thread::JoinHandle<()>,
}

impl TaskHandle {
    /// Task name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has exited its entry routine
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the entry routine to return
    ///
    /// Only meaningful for finite entry routines (tests); the demo tasks
    /// never return.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Hosted threads need more stack than an embedded budget; treat the
/// pool reservation as a lower bound.
const MIN_HOST_STACK: usize = 64 * 1024;

/// Create an auto-started task bound to `entry`
///
/// # Errors
/// `DeferredStart` if `auto_start` is false (the host backend has no
/// suspended-task state), `Create` if the backing thread cannot be
/// spawned.
pub fn spawn<F>(config: TaskConfig, entry: F) -> Result<TaskHandle, SpawnError>
where
    F: FnOnce() + Send + 'static,
{
    if !config.auto_start {
        return Err(SpawnError::DeferredStart { name: config.name });
    }

    log::debug!(
        "spawn task {:?}: priority {}, stack {} bytes at +{:#x}, time slice {:?}",
        config.name,
        config.priority.0,
        config.stack.size(),
        config.stack.offset(),
        config.time_slice,
    );

    let thread = thread::Builder::new()
        .name(config.name.into())
        .stack_size(config.stack.size().max(MIN_HOST_STACK))
        .spawn(entry)
        .map_err(|source| SpawnError::Create {
            name: config.name,
            source,
        })?;

    Ok(TaskHandle {
        name: config.name,
        thread,
    })
}
