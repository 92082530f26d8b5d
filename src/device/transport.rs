//! The abstract transport contract a device drives commands over.
//!
//! Grounded on `examples/original_source/scpidev/interface.py` and
//! `uinterface.py`, whose socket-level TCP/UDP/Serial classes are explicitly
//! out of scope here (spec.md §1, "external collaborators") — this module
//! only defines the contract those classes would implement, plus the
//! deferred-instantiation factory pattern from `device.py::create_interface`
//! (which stores a type/args/kwargs tuple and only builds the interface once
//! `start()` runs).
//!
//! `recv()` intentionally returns raw bytes rather than pre-split lines:
//! `uinterface.SCPIInterfaceTCP.recv()` and `udevice.py::poll()` disagree in
//! the original about whether a receive yields a whole line or a raw
//! string, a inconsistency this crate avoids by pushing all line-buffering
//! into `command::tokenizer::LineBuffer`, used identically by every
//! transport and both concurrency modes.

use std::fmt;

use thiserror::Error;

/// Identifies one registered transport for the lifetime of a [`crate::device::Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransportId(pub(crate) u64);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport#{}", self.0)
    }
}

/// The kind of interface a transport speaks, used only for diagnostics and
/// logging; behavior is entirely determined by the [`Transport`] impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Tcp,
    Udp,
    Serial,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
            TransportKind::Serial => "serial",
        };
        f.write_str(name)
    }
}

/// Errors a [`Transport`] implementation may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("transport I/O error: {0}")]
    Io(String),
    /// No data was available within the implementation's poll budget; not a
    /// failure, just nothing to report this round.
    #[error("no data available")]
    WouldBlock,
}

/// A single bidirectional command channel: a TCP connection, a UDP socket, a
/// serial port, or an in-memory stand-in used by tests.
///
/// A worker thread (in multi-worker mode) or `Device::poll` (in single-task
/// mode) owns the exclusive right to call `recv`/`write`/`close`; the
/// dispatcher only ever reaches a transport through the `Arc<Mutex<_>>`
/// wrapper `device::worker` and `device::single_task` install around it.
pub trait Transport: Send {
    /// A short, stable name for logging (e.g. a peer address).
    fn name(&self) -> String;

    /// Read whatever bytes are currently available, blocking for at most an
    /// implementation-defined short interval. Returns `Ok(vec![])` (not
    /// `WouldBlock`) when the transport is alive but idle; `WouldBlock` is
    /// reserved for transports that want the caller to back off.
    fn recv(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Write a complete response (already newline-terminated) back to the
    /// peer.
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Release any underlying resource. Called once processing of the
    /// current request is complete; in single-task mode this happens after
    /// every `poll()`, per spec.md's description of the remote-socket
    /// lifecycle.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// A deferred transport constructor, stored by `Device::create_interface`
/// and invoked only when `Device::start` or `Device::poll` actually need an
/// instance — mirrors `device.py::create_interface`'s stored
/// `(type, args, kwargs)` tuple.
pub type TransportFactory = Box<dyn Fn() -> Result<Box<dyn Transport>, TransportError> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kind_displays_lowercase_name() {
        assert_eq!(TransportKind::Tcp.to_string(), "tcp");
        assert_eq!(TransportKind::Serial.to_string(), "serial");
    }

    #[test]
    fn transport_id_displays_with_prefix() {
        assert_eq!(TransportId(7).to_string(), "transport#7");
    }
}
