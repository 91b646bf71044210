use std::cmp::min;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;

use crate::error::Result;
use crate::io::{ProtocolDecode, ProtocolEncode};
use crate::protocol::response::{EofPacket, OkPacket};
use crate::protocol::Capabilities;

pub(crate) const MAX_PAYLOAD_LEN: usize = 0xFF_FF_FF;

#[derive(Debug)]
pub(crate) struct Packet<T>(pub(crate) T);

impl<'en, 'stream, T> ProtocolEncode<'stream, (Capabilities, &'stream mut u8)> for Packet<T>
where
    T: ProtocolEncode<'en, Capabilities>,
{
    fn encode_with(
        &self,
        buf: &mut Vec<u8>,
        (capabilities, sequence_id): (Capabilities, &'stream mut u8),
    ) -> Result<()> {
        let mut next_header = |len: u32| {
            let mut buf = len.to_le_bytes();
            buf[3] = *sequence_id;
            *sequence_id = sequence_id.wrapping_add(1);

            buf
        };

        // reserve space to write the prefixed length
        let offset = buf.len();
        buf.extend(&[0_u8; 4]);

        // encode the payload
        self.0.encode_with(buf, capabilities)?;

        // determine the length of the encoded payload
        // and write to our reserved space
        let len = buf.len() - offset - 4;
        let header = &mut buf[offset..];

        #[allow(clippy::cast_possible_truncation)]
        header[..4].copy_from_slice(&next_header(min(len, MAX_PAYLOAD_LEN) as u32));

        // add more packets if we need to split the data
        if len >= MAX_PAYLOAD_LEN {
            let rest = buf.split_off(offset + 4 + MAX_PAYLOAD_LEN);
            let mut chunks = rest.chunks_exact(MAX_PAYLOAD_LEN);

            for chunk in chunks.by_ref() {
                buf.reserve(chunk.len() + 4);
                #[allow(clippy::cast_possible_truncation)]
                buf.extend(&next_header(chunk.len() as u32));
                buf.extend(chunk);
            }

            // this will also handle adding a zero sized packet if the data size is a multiple of 0xFF_FF_FF
            let remainder = chunks.remainder();
            buf.reserve(remainder.len() + 4);
            #[allow(clippy::cast_possible_truncation)]
            buf.extend(&next_header(remainder.len() as u32));
            buf.extend(remainder);
        }

        Ok(())
    }
}

impl Packet<Bytes> {
    pub(crate) fn decode<'de, T>(self) -> Result<T>
    where
        T: ProtocolDecode<'de, ()>,
    {
        self.decode_with(())
    }

    pub(crate) fn decode_with<'de, T, C>(self, context: C) -> Result<T>
    where
        T: ProtocolDecode<'de, C>,
    {
        T::decode_with(self.0, context)
    }

    pub(crate) fn ok(self) -> Result<OkPacket> {
        self.decode()
    }

    pub(crate) fn eof(self, capabilities: Capabilities) -> Result<EofPacket> {
        if capabilities.contains(Capabilities::DEPRECATE_EOF) {
            let ok = self.ok()?;

            Ok(EofPacket {
                warnings: ok.warnings,
                status: ok.status,
            })
        } else {
            self.decode_with(capabilities)
        }
    }

    /// Whether this packet terminates a result set.
    ///
    /// Rows can legitimately begin with `0xfe` (a length-encoded string longer
    /// than 16M), so only a short packet counts.
    pub(crate) fn is_end_of_rows(&self) -> bool {
        self.0.first() == Some(&0xfe) && self.0.len() < MAX_PAYLOAD_LEN
    }
}

impl Deref for Packet<Bytes> {
    type Target = Bytes;

    fn deref(&self) -> &Bytes {
        &self.0
    }
}

impl DerefMut for Packet<Bytes> {
    fn deref_mut(&mut self) -> &mut Bytes {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Packet, MAX_PAYLOAD_LEN};
    use crate::io::ProtocolEncode;
    use crate::protocol::text::Query;
    use crate::protocol::Capabilities;

    #[test]
    fn it_prefixes_length_and_sequence() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        let mut sequence_id = 0;

        Packet(Query("SELECT 1")).encode_with(&mut buf, (Capabilities::empty(), &mut sequence_id))?;

        assert_eq!(&buf[..], b"\x09\x00\x00\x00\x03SELECT 1");
        assert_eq!(sequence_id, 1);

        Ok(())
    }

    #[test]
    fn it_splits_large_payloads() -> anyhow::Result<()> {
        // COM_QUERY byte plus the text fills exactly one maximum-size packet
        let sql = "x".repeat(MAX_PAYLOAD_LEN - 1);

        let mut buf = Vec::new();
        let mut sequence_id = 0;

        Packet(Query(&sql)).encode_with(&mut buf, (Capabilities::empty(), &mut sequence_id))?;

        assert_eq!(&buf[..4], b"\xff\xff\xff\x00");
        // a full packet is always followed by a (here empty) continuation
        assert_eq!(&buf[4 + MAX_PAYLOAD_LEN..], b"\x00\x00\x00\x01");
        assert_eq!(sequence_id, 2);

        Ok(())
    }
}
