use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::io::{BufExt, ProtocolDecode};

// https://mariadb.com/kb/en/err_packet/
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_err_packet.html

#[derive(Debug, Clone)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: Option<String>,
    pub error_message: String,
}

impl ErrPacket {
    /// A client-side error, reported with the generic `HY000` state.
    pub(crate) fn new(code: u16, message: &str) -> Self {
        Self {
            error_code: code,
            sql_state: Some("HY000".to_owned()),
            error_message: message.to_owned(),
        }
    }
}

impl ProtocolDecode<'_> for ErrPacket {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        if buf.len() < 3 || buf[0] != 0xff {
            return Err(err_protocol!(
                "expected 0xff (ERR_Packet) but found {:?}",
                buf.first()
            ));
        }

        buf.advance(1);

        let error_code = buf.get_u16_le();

        let sql_state = if buf.first() == Some(&b'#') {
            // if the next byte is '#' then we have the SQL STATE
            buf.advance(1);

            Some(buf.get_str(5)?)
        } else {
            None
        };

        let error_message = String::from_utf8_lossy(&buf).into_owned();

        Ok(Self {
            error_code,
            sql_state,
            error_message,
        })
    }
}
