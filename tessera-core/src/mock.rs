use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use bytes::{Buf, BytesMut};

use crate::net::Socket;

/// One end of an in-memory, single-threaded duplex stream.
///
/// [`MockStream::stream`] returns the server end and parks the client end
/// under a fresh port number. A backend connecting to that port (on the
/// same thread) receives the client end. The server end is scripted up
/// front: anything written to it is what the client will read.
#[derive(Debug)]
#[doc(hidden)]
pub struct MockStream {
    port: u16,
    read: Rc<RefCell<BytesMut>>,
    write: Rc<RefCell<BytesMut>>,
}

thread_local! {
    static MOCK_STREAM_PORT: Cell<u16> = const { Cell::new(0) };

    static MOCK_STREAMS: RefCell<HashMap<u16, MockStream>> = RefCell::new(HashMap::new());
}

impl MockStream {
    #[must_use]
    pub fn stream() -> MockStream {
        let port = MOCK_STREAM_PORT.with(|port| {
            port.set(port.get().wrapping_add(1));
            port.get()
        });

        let to_server = Rc::new(RefCell::new(BytesMut::new()));
        let to_client = Rc::new(RefCell::new(BytesMut::new()));

        let client = MockStream {
            port,
            read: Rc::clone(&to_client),
            write: Rc::clone(&to_server),
        };

        let server = MockStream {
            port,
            read: to_server,
            write: to_client,
        };

        MOCK_STREAMS.with(|streams| streams.borrow_mut().insert(port, client));

        server
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Takes up to `n` bytes of what the other end has written so far.
    pub fn read_exact_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut read = self.read.borrow_mut();
        let n = n.min(read.len());

        read.split_to(n).to_vec()
    }

    /// Takes everything the other end has written so far.
    pub fn read_all(&mut self) -> Vec<u8> {
        self.read.borrow_mut().split().to_vec()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = self.read.borrow_mut();

        if read.is_empty() {
            // nothing scripted; behave like a peer that hung up
            return Ok(0);
        }

        let n = buf.len().min(read.len());
        buf[..n].copy_from_slice(&read[..n]);
        read.advance(n);

        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write.borrow_mut().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Socket for MockStream {
    fn connect_tcp(_host: &str, port: u16, _timeout: Option<Duration>) -> io::Result<Self> {
        MOCK_STREAMS
            .with(|streams| streams.borrow_mut().remove(&port))
            .ok_or_else(|| io::ErrorKind::ConnectionRefused.into())
    }
}
