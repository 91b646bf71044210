use bytes::buf::Chain;
use bytes::{Buf, Bytes};

use crate::error::{Error, Result};
use crate::io::{BufExt, ProtocolDecode, ProtocolEncode};
use crate::protocol::response::OkPacket;
use crate::protocol::Capabilities;
use crate::MariaDbDatabaseError;

/// What the server answers to a handshake response or an auth response.
#[derive(Debug)]
pub(crate) enum Auth {
    Ok(OkPacket),
    MoreData(Bytes),
    Switch(AuthSwitch),
}

impl ProtocolDecode<'_> for Auth {
    fn decode_with(buf: Bytes, _: ()) -> Result<Self> {
        match buf.first() {
            Some(0x00) => OkPacket::decode(buf).map(Self::Ok),
            Some(0x01) => Ok(Self::MoreData(buf.slice(1..))),
            Some(0xfe) => AuthSwitch::decode(buf).map(Self::Switch),

            tag => Err(Error::connection(MariaDbDatabaseError::malformed_packet(
                &format!("Received {tag:02x?} but expected one of: 0x0, 0x1, or 0xfe"),
            ))),
        }
    }
}

// https://mariadb.com/kb/en/connection/#authentication-switch-request

#[derive(Debug)]
pub(crate) struct AuthSwitch {
    pub(crate) plugin_name: String,
    pub(crate) data: Chain<Bytes, Bytes>,
}

impl ProtocolDecode<'_> for AuthSwitch {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        buf.advance(1);

        let plugin_name = buf.get_str_nul()?;

        // the new nonce is NUL-terminated
        if buf.last() == Some(&0) {
            buf.truncate(buf.len() - 1);
        }

        Ok(Self {
            plugin_name,
            data: buf.chain(Bytes::new()),
        })
    }
}

#[derive(Debug)]
pub(crate) struct AuthResponse<'a>(pub(crate) &'a [u8]);

impl ProtocolEncode<'_, Capabilities> for AuthResponse<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<()> {
        buf.extend_from_slice(self.0);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Buf;

    use super::{Auth, ProtocolDecode};

    #[test]
    fn test_decode_auth_switch_packet_data() -> anyhow::Result<()> {
        const AUTH_SWITCH: &[u8] = b"\xfecaching_sha2_password\x00abcdefghijabcdefghij\x00";

        let Auth::Switch(switch) = Auth::decode(AUTH_SWITCH.into())? else {
            panic!("expected an auth switch");
        };

        assert_eq!(switch.plugin_name, "caching_sha2_password");
        assert_eq!(switch.data.first_ref(), &b"abcdefghijabcdefghij"[..]);
        assert_eq!(switch.data.remaining(), 20);

        Ok(())
    }

    #[test]
    fn test_decode_auth_more_data() -> anyhow::Result<()> {
        let Auth::MoreData(data) = Auth::decode((&b"\x01\x04"[..]).into())? else {
            panic!("expected more data");
        };

        assert_eq!(&data[..], b"\x04");

        Ok(())
    }

    #[test]
    fn test_decode_auth_unknown_tag() {
        let err = Auth::decode((&b"\x07"[..]).into()).unwrap_err();

        assert!(err.to_string().contains("Malformed packet"), "{err}");
    }
}
