//! Multi-worker mode: one thread per transport plus one dispatcher thread.
//!
//! Grounded on `examples/original_source/scpidev/device.py`
//! (`_run_threaded`, which spawns a `data_handler` thread per interface and
//! pulls from a shared queue with a 1s timeout) and generalized into Rust's
//! `mpsc` channel plus `std::thread`, the concurrency primitives
//! `examples/peat-brubeck` never needed but that the other pack repos reach
//! for when they need a worker pool.
//!
//! Transports only ever `recv()` (worker threads) or get written to/closed
//! (the dispatcher thread); neither side touches the command registry or
//! alarm trace directly, keeping spec.md §5's single-writer invariant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use super::shared::SharedState;
use super::transport::{Transport, TransportError, TransportId};
use crate::command::tokenizer::LineBuffer;

/// One unit of work handed from a transport worker thread to the dispatcher.
pub enum WorkItem {
    Line { transport: TransportId, text: String },
    DecodeError { transport: TransportId },
}

const IDLE_POLL: Duration = Duration::from_millis(50);
const IO_ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// Spawn one thread per transport. Each reads raw bytes, buffers them into
/// complete lines with its own [`LineBuffer`], and forwards each line to
/// `sender`.
pub fn spawn_workers(
    transports: Vec<(TransportId, Arc<Mutex<Box<dyn Transport>>>)>,
    sender: SyncSender<WorkItem>,
    stop_flag: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    transports
        .into_iter()
        .map(|(id, transport)| {
            let sender = sender.clone();
            let stop_flag = Arc::clone(&stop_flag);
            thread::spawn(move || run_worker(id, transport, sender, stop_flag))
        })
        .collect()
}

fn run_worker(
    id: TransportId,
    transport: Arc<Mutex<Box<dyn Transport>>>,
    sender: SyncSender<WorkItem>,
    stop_flag: Arc<AtomicBool>,
) {
    let mut buffer = LineBuffer::new();
    while !stop_flag.load(Ordering::Relaxed) {
        let received = {
            match transport.lock() {
                Ok(mut guard) => guard.recv(),
                Err(_) => return,
            }
        };
        match received {
            Ok(bytes) if bytes.is_empty() => thread::sleep(IDLE_POLL),
            Ok(bytes) => match buffer.feed(&bytes) {
                Ok(lines) => {
                    for text in lines {
                        if sender.send(WorkItem::Line { transport: id, text }).is_err() {
                            return;
                        }
                    }
                }
                Err(_) => {
                    if sender.send(WorkItem::DecodeError { transport: id }).is_err() {
                        return;
                    }
                }
            },
            Err(TransportError::WouldBlock) => thread::sleep(IDLE_POLL),
            Err(TransportError::Closed) => {
                debug!("{id} closed, worker exiting");
                return;
            }
            Err(TransportError::Io(message)) => {
                warn!("{id} I/O error: {message}");
                thread::sleep(IO_ERROR_BACKOFF);
            }
        }
    }
}

/// The sole consumer of the work queue: matches and executes commands,
/// mutating the alarm trace and command history, then writes the response
/// back through the originating transport.
pub fn run_dispatcher(
    receiver: Receiver<WorkItem>,
    stop_flag: Arc<AtomicBool>,
    shared: Arc<SharedState>,
    transports: HashMap<TransportId, Arc<Mutex<Box<dyn Transport>>>>,
) {
    while !stop_flag.load(Ordering::Relaxed) {
        match receiver.recv_timeout(Duration::from_secs(1)) {
            Ok(WorkItem::Line { transport, text }) => {
                let response = shared.execute_line(&text);
                if let Some(response) = response {
                    write_response(&transports, transport, response.as_bytes());
                }
            }
            Ok(WorkItem::DecodeError { transport }) => {
                shared.set_alarm(format!("{transport} sent a line that was not valid UTF-8."));
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Multi-worker mode keeps connections open across requests, unlike
/// single-task `poll()`, which explicitly closes after every request; so
/// only the write happens here.
fn write_response(
    transports: &HashMap<TransportId, Arc<Mutex<Box<dyn Transport>>>>,
    id: TransportId,
    data: &[u8],
) {
    let Some(transport) = transports.get(&id) else {
        return;
    };
    let mut guard = match transport.lock() {
        Ok(guard) => guard,
        Err(_) => return,
    };
    if let Err(err) = guard.write(data) {
        warn!("{id} write failed: {err}");
    }
}
