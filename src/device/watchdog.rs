//! The watchdog thread: periodic liveness and alarm-count logging.
//!
//! Grounded on `examples/original_source/scpidev/device.py`
//! (`_watchdog_handler`, which sleeps 1s per iteration and logs alive-thread
//! counts every 10 iterations).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;

use super::shared::SharedState;

const LOG_EVERY_N_TICKS: u64 = 10;

/// Spawn the watchdog thread. Wakes at `interval` (clamped to at most 1s so
/// it notices `stop_flag` promptly) and logs a summary every
/// [`LOG_EVERY_N_TICKS`] ticks.
pub fn spawn_watchdog(
    stop_flag: Arc<AtomicBool>,
    interval: Duration,
    worker_count: usize,
    shared: Arc<SharedState>,
) -> JoinHandle<()> {
    let tick = interval.min(Duration::from_secs(1));
    thread::spawn(move || {
        let mut ticks: u64 = 0;
        while !stop_flag.load(Ordering::Relaxed) {
            thread::sleep(tick);
            ticks += 1;
            if ticks % LOG_EVERY_N_TICKS == 0 {
                let pending = shared.pending_alarm_count();
                info!(
                    "watchdog: {worker_count} transport worker(s) alive, {pending} pending alarm(s)"
                );
            }
        }
    })
}
