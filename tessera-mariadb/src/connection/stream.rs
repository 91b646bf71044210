//! Reads and writes packets to and from the MariaDB server.
//!
//! Packets are prefixed by 4 bytes: 3 for the payload length (in LE) and a
//! sequence id. A payload of `2 ** 24 - 1` bytes or more is split into full
//! packets followed by a shorter (possibly empty) one, each with an
//! increasing sequence id.
//!
//! <https://mariadb.com/kb/en/0-packet/>

use std::io;

use bytes::Bytes;
use tessera_core::Socket;

use crate::error::Result;
use crate::io::{ProtocolDecode, ProtocolEncode};
use crate::protocol::response::ErrPacket;
use crate::protocol::{Capabilities, Packet, MAX_PAYLOAD_LEN};
use crate::MariaDbDatabaseError;

#[derive(Debug)]
pub(crate) struct MariaDbStream<S> {
    socket: S,
    pub(crate) capabilities: Capabilities,
    pub(crate) connection_id: u32,
    sequence_id: u8,
    wbuf: Vec<u8>,
}

impl<S: Socket> MariaDbStream<S> {
    pub(crate) fn new(socket: S, capabilities: Capabilities) -> Self {
        Self {
            socket,
            capabilities,
            connection_id: 0,
            sequence_id: 0,
            wbuf: Vec::with_capacity(1024),
        }
    }

    /// Starts a new command, resetting the sequence id.
    pub(crate) fn send_packet<'en, T>(&mut self, payload: T) -> Result<()>
    where
        T: ProtocolEncode<'en, Capabilities>,
    {
        self.sequence_id = 0;
        self.write_packet(payload)
    }

    /// Writes a packet that continues the current exchange.
    pub(crate) fn write_packet<'en, T>(&mut self, payload: T) -> Result<()>
    where
        T: ProtocolEncode<'en, Capabilities>,
    {
        self.wbuf.clear();

        Packet(payload).encode_with(&mut self.wbuf, (self.capabilities, &mut self.sequence_id))?;

        self.socket.write_all(&self.wbuf)?;
        self.socket.flush()?;

        Ok(())
    }

    /// Reads the next packet, reassembling split payloads.
    ///
    /// An ERR packet is returned as [`MariaDbDatabaseError`].
    pub(crate) fn recv_packet(&mut self) -> Result<Packet<Bytes>> {
        let mut payload = Vec::new();

        loop {
            let mut header = [0_u8; 4];
            self.socket.read_exact(&mut header)?;

            let len = usize::from(header[0])
                | usize::from(header[1]) << 8
                | usize::from(header[2]) << 16;

            // to respond to a packet the next sequence id must be used
            self.sequence_id = header[3].wrapping_add(1);

            let offset = payload.len();
            payload.resize(offset + len, 0);
            self.socket.read_exact(&mut payload[offset..])?;

            if len < MAX_PAYLOAD_LEN {
                break;
            }
        }

        let payload = Bytes::from(payload);

        if payload.first() == Some(&0xff) {
            let err = ErrPacket::decode(payload)?;
            return Err(MariaDbDatabaseError(err).into());
        }

        Ok(Packet(payload))
    }

    pub(crate) fn recv<'de, T>(&mut self) -> Result<T>
    where
        T: ProtocolDecode<'de, ()>,
    {
        self.recv_packet()?.decode()
    }

    pub(crate) fn shutdown(&mut self) -> io::Result<()> {
        self.socket.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tessera_core::mock::MockStream;
    use tessera_core::{DatabaseError, Error, Socket};

    use super::MariaDbStream;
    use crate::protocol::text::Query;
    use crate::protocol::{Capabilities, MAX_PAYLOAD_LEN};

    fn pair() -> anyhow::Result<(MockStream, MariaDbStream<MockStream>)> {
        let server = MockStream::stream();
        let client = MockStream::connect_tcp("localhost", server.port(), None)?;

        Ok((server, MariaDbStream::new(client, Capabilities::empty())))
    }

    #[test]
    fn it_continues_the_sequence_after_a_reply() -> anyhow::Result<()> {
        let (mut server, mut stream) = pair()?;

        server.write_all(b"\x01\x00\x00\x04\x00")?;

        assert_eq!(&stream.recv_packet()?[..], b"\x00");

        stream.write_packet(Query("SELECT 1"))?;
        assert_eq!(server.read_exact_bytes(4), b"\x09\x00\x00\x05");
        server.read_all();

        stream.send_packet(Query("SELECT 1"))?;
        assert_eq!(server.read_exact_bytes(4), b"\x09\x00\x00\x00");

        Ok(())
    }

    #[test]
    fn it_reassembles_split_payloads() -> anyhow::Result<()> {
        let (mut server, mut stream) = pair()?;

        server.write_all(b"\xff\xff\xff\x00")?;
        server.write_all(&vec![b'a'; MAX_PAYLOAD_LEN])?;
        server.write_all(b"\x02\x00\x00\x01bc")?;

        let packet = stream.recv_packet()?;
        assert_eq!(packet.len(), MAX_PAYLOAD_LEN + 2);
        assert!(packet.ends_with(b"abc"));

        Ok(())
    }

    #[test]
    fn it_returns_err_packets_as_database_errors() -> anyhow::Result<()> {
        let (mut server, mut stream) = pair()?;

        server.write_all(b"\x29\x00\x00\x01\xff\x7a\x04#42S02Table 'shop.users' doesn't exist")?;

        let err = match stream.recv_packet() {
            Err(Error::Database(err)) => err,
            other => panic!("expected a database error, got {other:?}"),
        };

        assert_eq!(err.code().as_deref(), Some("42S02"));
        assert_eq!(err.message(), "Table 'shop.users' doesn't exist");

        Ok(())
    }

    #[test]
    fn it_fails_when_the_server_hangs_up() -> anyhow::Result<()> {
        let (mut server, mut stream) = pair()?;

        server.write_all(b"\x05\x00\x00\x01ab")?;

        assert!(matches!(stream.recv_packet(), Err(Error::Io(_))));

        Ok(())
    }
}
