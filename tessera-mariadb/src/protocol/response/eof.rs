use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::io::ProtocolDecode;
use crate::protocol::response::Status;
use crate::protocol::Capabilities;

/// Marks the end of a result set, returning status and warnings.
///
/// # Note
///
/// The EOF packet is deprecated as of MySQL 5.7.5 and MariaDB 10.2; it is
/// only read from servers that do not support `DEPRECATE_EOF`.
#[derive(Debug)]
pub(crate) struct EofPacket {
    pub(crate) warnings: u16,
    pub(crate) status: Status,
}

impl ProtocolDecode<'_, Capabilities> for EofPacket {
    fn decode_with(mut buf: Bytes, _: Capabilities) -> Result<Self> {
        if buf.len() < 5 || buf[0] != 0xfe {
            return Err(err_protocol!(
                "expected 0xfe (EOF_Packet) but found {:?}",
                buf.first()
            ));
        }

        buf.advance(1);

        let warnings = buf.get_u16_le();
        let status = Status::from_bits_truncate(buf.get_u16_le());

        Ok(Self { status, warnings })
    }
}
