//! Shared test infrastructure: an in-memory `Transport` standing in for a
//! real socket, usable from both multi-worker and single-task tests.

use std::sync::{Arc, Mutex};

use scpi_device::device::transport::{Transport, TransportError};

/// An in-memory transport. `inbox` holds bytes waiting to be "received";
/// every `write` appends to `outbox`. Both are shared so a test can feed
/// input and inspect output from outside the thread driving the transport.
pub struct TestTransport {
    name: String,
    inbox: Arc<Mutex<Vec<u8>>>,
    outbox: Arc<Mutex<Vec<u8>>>,
    closed: bool,
}

impl TestTransport {
    pub fn new(name: impl Into<String>) -> (Self, TestTransportHandle) {
        let inbox = Arc::new(Mutex::new(Vec::new()));
        let outbox = Arc::new(Mutex::new(Vec::new()));
        let handle = TestTransportHandle {
            inbox: Arc::clone(&inbox),
            outbox: Arc::clone(&outbox),
        };
        (
            TestTransport {
                name: name.into(),
                inbox,
                outbox,
                closed: false,
            },
            handle,
        )
    }
}

impl Transport for TestTransport {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut inbox = self.inbox.lock().expect("inbox lock poisoned");
        Ok(std::mem::take(&mut *inbox))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.outbox
            .lock()
            .expect("outbox lock poisoned")
            .extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

/// The test-side handle to a [`TestTransport`]: feed input lines and read
/// back whatever has been written so far.
#[derive(Clone)]
pub struct TestTransportHandle {
    inbox: Arc<Mutex<Vec<u8>>>,
    outbox: Arc<Mutex<Vec<u8>>>,
}

impl TestTransportHandle {
    pub fn send_line(&self, line: &str) {
        let mut inbox = self.inbox.lock().expect("inbox lock poisoned");
        inbox.extend_from_slice(line.as_bytes());
        inbox.push(b'\n');
    }

    pub fn written(&self) -> String {
        let outbox = self.outbox.lock().expect("outbox lock poisoned");
        String::from_utf8(outbox.clone()).expect("written bytes are valid UTF-8")
    }
}
