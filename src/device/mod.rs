//! A SCPI instrument device: a command registry, zero or more transports,
//! and the concurrency machinery that drives commands from the wire into
//! the registry and responses back out.
//!
//! Two mutually exclusive ways to run a [`Device`], grounded on the two
//! original implementations that inspired them:
//!
//! - **Multi-worker mode** (`start`/`stop`), grounded on
//!   `examples/original_source/scpidev/device.py`'s threaded
//!   `SCPIDevice`: one thread per transport plus one dispatcher thread plus
//!   one watchdog thread, communicating over a bounded channel.
//! - **Single-task mode** (`poll`), grounded on
//!   `examples/original_source/scpidev/udevice.py`'s micropython
//!   `SCPIDeviceMicro`: a single synchronous call processes exactly one
//!   registered transport, with no background threads at all.
//!
//! Both modes execute lines through the same [`shared::SharedState`], so
//! matching, dispatch, alarm recording and history bookkeeping behave
//! identically regardless of which mode is driving them.

mod alarm;
mod shared;
pub mod single_task;
pub mod standard;
pub mod transport;
pub mod watchdog;
pub mod worker;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;
use thiserror::Error;

use crate::command::Command;
use crate::grammar::CompileError;
use shared::SharedState;
use single_task::SingleTaskState;
use transport::{Transport, TransportError, TransportFactory, TransportId, TransportKind};
use worker::WorkItem;

/// Errors raised by device-level operations: registration, lifecycle
/// control, and single-task polling.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to compile command: {0}")]
    Compile(#[from] CompileError),
    #[error("device is already running")]
    AlreadyRunning,
    #[error("device is not running")]
    NotRunning,
    #[error("stop timed out before every thread exited")]
    StopTimedOut,
    #[error("single-task mode requires exactly one registered transport, found {0}")]
    WrongTransportCountForPoll(usize),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("received a line that was not valid UTF-8")]
    Decode,
}

struct TransportSlot {
    kind: TransportKind,
    factory: TransportFactory,
}

/// Handles kept only while the device is running in multi-worker mode.
struct RunningHandles {
    stop_flag: Arc<AtomicBool>,
    dispatcher: JoinHandle<()>,
    watchdog: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

/// A SCPI instrument device. Build one with [`Device::new`], register
/// commands and transports, then drive it with [`Device::start`]/
/// [`Device::stop`] or repeated [`Device::poll`] calls.
pub struct Device {
    shared: Arc<SharedState>,
    transports: Mutex<HashMap<TransportId, TransportSlot>>,
    next_transport_id: AtomicU64,
    queue_capacity: usize,
    watchdog_interval: Duration,
    running: Mutex<Option<RunningHandles>>,
    single_task_state: Mutex<Option<SingleTaskState>>,
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Device {
    /// A device with no registered commands or transports, a command
    /// history depth of 100, a work queue capacity of 64, and a 1 second
    /// watchdog interval.
    pub fn new() -> Self {
        Device {
            shared: Arc::new(SharedState::new(100)),
            transports: Mutex::new(HashMap::new()),
            next_transport_id: AtomicU64::new(1),
            queue_capacity: 64,
            watchdog_interval: Duration::from_secs(1),
            running: Mutex::new(None),
            single_task_state: Mutex::new(None),
        }
    }

    pub fn with_history_depth(self, depth: usize) -> Self {
        Device {
            shared: Arc::new(SharedState::new(depth)),
            ..self
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_watchdog_interval(mut self, interval: Duration) -> Self {
        self.watchdog_interval = interval;
        self
    }

    /// Register the IDN string and the standard `*`/`:SYSTem` commands;
    /// see [`standard`].
    pub fn with_standard_commands(self, idn: impl Into<String>) -> Result<Self, DeviceError> {
        standard::register(&self, idn.into())?;
        Ok(self)
    }

    pub fn add_command(&self, command: Command) {
        self.shared.add_command(command);
    }

    /// The specification text of every registered command, sorted.
    pub fn list_commands(&self) -> Vec<String> {
        self.shared.list_commands()
    }

    pub fn get_command_history(&self) -> Vec<String> {
        self.shared.get_command_history()
    }

    pub fn set_alarm(&self, message: impl Into<String>) {
        self.shared.set_alarm(message);
    }

    /// Pop the most recently pushed alarm message (LIFO), if any.
    pub fn pop_alarm(&self) -> Option<String> {
        self.shared.pop_alarm()
    }

    /// `clear_history = true` empties the entire alarm trace (`*CLS`);
    /// `false` acknowledges only the current alarm.
    pub fn clear_alarm(&self, clear_history: bool) {
        self.shared.clear_alarm(clear_history);
    }

    /// Register a transport factory without instantiating it; the
    /// transport is only constructed once [`Device::start`] or
    /// [`Device::poll`] need it, mirroring `device.py::create_interface`'s
    /// deferred `(type, args, kwargs)` tuple.
    pub fn create_interface(&self, kind: TransportKind, factory: TransportFactory) -> TransportId {
        let id = TransportId(self.next_transport_id.fetch_add(1, Ordering::Relaxed));
        self.transports
            .lock()
            .expect("transport lock poisoned")
            .insert(id, TransportSlot { kind, factory });
        id
    }

    /// Execute one already-assembled line directly, bypassing any
    /// transport. Exposed mainly for tests and for embedders that already
    /// have a line from elsewhere.
    pub fn execute_line(&self, line: &str) -> Option<String> {
        self.shared.execute_line(line)
    }

    /// Start multi-worker mode: spawn one thread per registered transport,
    /// one dispatcher thread, and one watchdog thread. Returns as soon as
    /// every thread is spawned; never blocks waiting for them to finish.
    pub fn start(&self) -> Result<(), DeviceError> {
        let mut running = self.running.lock().expect("running lock poisoned");
        if running.is_some() {
            return Err(DeviceError::AlreadyRunning);
        }

        let mut instances = Vec::new();
        let mut lookup = HashMap::new();
        {
            let transports = self.transports.lock().expect("transport lock poisoned");
            for (id, slot) in transports.iter() {
                let transport = (slot.factory)()?;
                info!("starting {} transport {id}", slot.kind);
                let handle = Arc::new(Mutex::new(transport));
                instances.push((*id, Arc::clone(&handle)));
                lookup.insert(*id, handle);
            }
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::sync_channel::<WorkItem>(self.queue_capacity);

        let workers = worker::spawn_workers(instances, sender, Arc::clone(&stop_flag));

        let dispatcher = {
            let stop_flag = Arc::clone(&stop_flag);
            let shared = Arc::clone(&self.shared);
            thread::spawn(move || worker::run_dispatcher(receiver, stop_flag, shared, lookup))
        };

        let watchdog = watchdog::spawn_watchdog(
            Arc::clone(&stop_flag),
            self.watchdog_interval,
            workers.len(),
            Arc::clone(&self.shared),
        );

        let worker_count = workers.len();
        *running = Some(RunningHandles {
            stop_flag,
            dispatcher,
            watchdog,
            workers,
        });
        info!("device started with {worker_count} transport worker(s)");
        Ok(())
    }

    /// Stop multi-worker mode, signaling every thread and joining them
    /// before returning. `timeout`, when given, bounds how long this call
    /// waits for every thread to notice the stop flag and exit; per
    /// spec.md §5 each worker observes the flag within one select/poll
    /// timeout (≤1s), so a `timeout` shorter than that is likely to elapse
    /// before anything has actually joined. A handle that outlives
    /// `timeout` is left to finish on its own (dropping a `JoinHandle`
    /// does not abort the thread) and `stop` returns
    /// [`DeviceError::StopTimedOut`] rather than blocking further.
    pub fn stop(&self, timeout: Option<Duration>) -> Result<(), DeviceError> {
        let handles = self
            .running
            .lock()
            .expect("running lock poisoned")
            .take();
        match handles {
            Some(handles) => {
                handles.stop_flag.store(true, Ordering::SeqCst);
                let mut pending: Vec<JoinHandle<()>> = handles.workers;
                pending.push(handles.dispatcher);
                pending.push(handles.watchdog);

                match timeout {
                    None => {
                        for handle in pending {
                            let _ = handle.join();
                        }
                        Ok(())
                    }
                    Some(timeout) => {
                        let deadline = std::time::Instant::now() + timeout;
                        let mut remaining = pending;
                        while !remaining.is_empty() && std::time::Instant::now() < deadline {
                            remaining.retain(|h| !h.is_finished());
                            if remaining.is_empty() {
                                break;
                            }
                            thread::sleep(Duration::from_millis(10));
                        }
                        if remaining.is_empty() {
                            Ok(())
                        } else {
                            Err(DeviceError::StopTimedOut)
                        }
                    }
                }
            }
            None => Err(DeviceError::NotRunning),
        }
    }

    /// Synchronously service the device's single registered transport:
    /// instantiate it on first use, read whatever bytes are available,
    /// execute every complete line they yield, write back any response,
    /// then close the transport.
    pub fn poll(&self) -> Result<(), DeviceError> {
        single_task::poll(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::action::ActionRequest;

    #[test]
    fn execute_line_runs_registered_commands() {
        let device = Device::new();
        device.add_command(
            Command::new("*IDN?", "idn", "", |_: &ActionRequest| {
                Ok(Some("ACME,1,0,1.0".to_string()))
            })
            .unwrap(),
        );
        assert_eq!(device.execute_line("*IDN?").as_deref(), Some("ACME,1,0,1.0\n"));
    }

    #[test]
    fn standard_commands_cover_help_and_errors() {
        let device = Device::new().with_standard_commands("ACME,1,0,1.0").unwrap();
        assert!(device.list_commands().iter().any(|s| s.contains("HELP")));
        device.execute_line("BOGUS?");
        let error = device.execute_line(":SYSTem:ERRor?").unwrap();
        assert!(error.contains("No match found"));
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let device = Device::new();
        assert!(matches!(device.stop(None), Err(DeviceError::NotRunning)));
    }

    #[test]
    fn poll_without_exactly_one_transport_is_an_error() {
        let device = Device::new();
        assert!(matches!(
            device.poll(),
            Err(DeviceError::WrongTransportCountForPoll(0))
        ));
    }
}
