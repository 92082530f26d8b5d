//! Single-task mode: synchronous, one-transport-at-a-time polling.
//!
//! Grounded on `examples/original_source/scpidev/udevice.py`
//! (`SCPIDeviceMicro.poll`), the micropython variant that has no thread
//! support and expects its caller to invoke `poll()` from its own run loop.
//! Unlike the original, `poll()` here always closes the transport after
//! processing a request (per spec.md's description of the remote-socket
//! lifecycle) even though the original's `poll()` does not — an
//! inconsistency documented in `DESIGN.md` rather than reproduced.

use crate::command::tokenizer::{DecodeError, LineBuffer};

use super::transport::Transport;
use super::{Device, DeviceError};

/// Persistent state kept across `poll()` calls: the single instantiated
/// transport and its line buffer, since a request can arrive split across
/// more than one `poll()`.
pub(super) struct SingleTaskState {
    transport: Box<dyn Transport>,
    buffer: LineBuffer,
}

impl SingleTaskState {
    pub(super) fn new(transport: Box<dyn Transport>) -> Self {
        SingleTaskState {
            transport,
            buffer: LineBuffer::new(),
        }
    }
}

impl From<DecodeError> for DeviceError {
    fn from(_: DecodeError) -> Self {
        DeviceError::Decode
    }
}

/// Service one round of the device's single registered transport: read
/// whatever bytes are available, execute every complete line they yield,
/// write back any response, then close.
pub(super) fn poll(device: &Device) -> Result<(), DeviceError> {
    {
        let transports = device.transports.lock().expect("transport lock poisoned");
        if transports.len() != 1 {
            return Err(DeviceError::WrongTransportCountForPoll(transports.len()));
        }
    }

    let mut state_guard = device
        .single_task_state
        .lock()
        .expect("single-task lock poisoned");

    if state_guard.is_none() {
        let mut transports = device.transports.lock().expect("transport lock poisoned");
        let slot = transports
            .values_mut()
            .next()
            .expect("transport count checked above");
        let transport = (slot.factory)()?;
        *state_guard = Some(SingleTaskState::new(transport));
    }

    let state = state_guard.as_mut().expect("just initialized above");

    let bytes = state.transport.recv()?;
    if bytes.is_empty() {
        return Ok(());
    }

    let lines = state.buffer.feed(&bytes)?;
    for line in lines {
        if let Some(response) = device.shared.execute_line(&line) {
            state.transport.write(response.as_bytes())?;
        }
    }
    state.transport.close()?;

    Ok(())
}
