//! Demo binary: bring the exchange up and report progress.
//!
//! The exchange itself produces no output; this binary periodically logs
//! both peers' counters so a human can watch the cycle count grow. It
//! runs until interrupted, like the target it models.

use std::thread;
use std::time::Duration;

use relay_pingpong::{bring_up, DemoConfig, POOL_SIZE, QUEUE_CAPACITY};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let demo = match bring_up(DemoConfig::default()) {
        Ok(demo) => demo,
        Err(err) => {
            // Allocation or task-creation failure at bring-up halts the
            // whole system before any task starts.
            log::error!("bring-up failed, system halted: {err}");
            std::process::exit(1);
        }
    };

    log::info!(
        "relay ping-pong running on platform {:?} (channel capacity {}, pool {} bytes)",
        relay_platform::backend(),
        QUEUE_CAPACITY,
        POOL_SIZE
    );

    loop {
        thread::sleep(Duration::from_secs(1));

        let (sa, ra, ca) = demo.stats_a.snapshot();
        let (sb, rb, cb) = demo.stats_b.snapshot();
        log::info!(
            "task_a sent={sa} received={ra} cycles={ca} | task_b sent={sb} received={rb} cycles={cb}"
        );

        if demo.task_a.is_finished() || demo.task_b.is_finished() {
            log::error!("a task exited its loop; halting");
            std::process::exit(1);
        }
    }
}
