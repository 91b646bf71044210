use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::io::{MariaDbBufExt, ProtocolDecode};
use crate::protocol::response::Status;

/// Indicates successful completion of a previous command sent by the client.
#[derive(Debug)]
pub(crate) struct OkPacket {
    pub(crate) affected_rows: u64,
    pub(crate) last_insert_id: u64,
    pub(crate) status: Status,
    pub(crate) warnings: u16,
}

impl ProtocolDecode<'_> for OkPacket {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        let header = buf.first().copied();
        if header != Some(0x00) && header != Some(0xfe) {
            return Err(err_protocol!(
                "expected 0x00 or 0xfe (OK_Packet) but found {:?}",
                header
            ));
        }

        buf.advance(1);

        let affected_rows = buf.get_uint_lenenc()?;
        let last_insert_id = buf.get_uint_lenenc()?;

        // pre-4.1 servers may stop here
        let (status, warnings) = if buf.remaining() >= 4 {
            (Status::from_bits_truncate(buf.get_u16_le()), buf.get_u16_le())
        } else {
            (Status::empty(), 0)
        };

        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
        })
    }
}

#[test]
fn test_decode_ok_packet() {
    const DATA: &[u8] = b"\x00\x00\x00\x02@\x00\x00";

    let p = OkPacket::decode(DATA.into()).unwrap();

    assert_eq!(p.affected_rows, 0);
    assert_eq!(p.last_insert_id, 0);
    assert_eq!(p.warnings, 0);
    assert!(p.status.contains(Status::AUTOCOMMIT));
    assert!(p.status.contains(Status::SESSION_STATE_CHANGED));
}

#[test]
fn test_decode_ok_packet_with_insert_id() {
    const DATA: &[u8] = b"\x00\x01\x07\x02\x00\x01\x00";

    let p = OkPacket::decode(DATA.into()).unwrap();

    assert_eq!(p.affected_rows, 1);
    assert_eq!(p.last_insert_id, 7);
    assert_eq!(p.warnings, 1);
}
