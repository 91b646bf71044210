use crate::error::Result;
use crate::io::{BufMutExt, MariaDbBufMutExt, ProtocolEncode};
use crate::protocol::Capabilities;

// https://mariadb.com/kb/en/connection/#client-handshake-response
// https://dev.mysql.com/doc/internals/en/connection-phase-packets.html#packet-Protocol::HandshakeResponse

#[derive(Debug)]
pub(crate) struct HandshakeResponse<'a> {
    pub(crate) database: Option<&'a str>,

    /// Max size of a command packet that the client wants to send to the server
    pub(crate) max_packet_size: u32,

    /// Default collation for the connection
    pub(crate) collation: u8,

    /// Name of the SQL account which client wants to log in
    pub(crate) username: &'a str,

    /// Authentication method used by the client
    pub(crate) auth_plugin_name: Option<&'a str>,

    /// Opaque authentication response
    pub(crate) auth_response: &'a [u8],
}

impl ProtocolEncode<'_, Capabilities> for HandshakeResponse<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, mut context: Capabilities) -> Result<()> {
        if self.auth_plugin_name.is_none() {
            // ensure PLUGIN_AUTH is set *only* if we have a defined plugin
            context.remove(Capabilities::PLUGIN_AUTH);
        }

        // the low 32 bits are the only ones with a meaning on the wire
        #[allow(clippy::cast_possible_truncation)]
        buf.extend(&(context.bits() as u32).to_le_bytes());
        buf.extend(&self.max_packet_size.to_le_bytes());
        buf.push(self.collation);

        // reserved : string<19>
        // MariaDB extended client capabilities (unused) : int<4>
        buf.extend(&[0_u8; 23]);

        buf.put_str_nul(self.username);

        if context.contains(Capabilities::PLUGIN_AUTH_LENENC_DATA) {
            buf.put_bytes_lenenc(self.auth_response);
        } else if context.contains(Capabilities::SECURE_CONNECTION) {
            let response_len = u8::try_from(self.auth_response.len()).map_err(|_| {
                err_protocol!("auth_response.len() too long: {}", self.auth_response.len())
            })?;

            buf.push(response_len);
            buf.extend(self.auth_response);
        } else {
            buf.extend(self.auth_response);
            buf.push(0);
        }

        if context.contains(Capabilities::CONNECT_WITH_DB) {
            buf.put_str_nul(self.database.unwrap_or_default());
        }

        if context.contains(Capabilities::PLUGIN_AUTH) {
            buf.put_str_nul(self.auth_plugin_name.unwrap_or_default());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::HandshakeResponse;
    use crate::io::ProtocolEncode;
    use crate::protocol::Capabilities;

    #[test]
    fn it_encodes_database_and_plugin() -> anyhow::Result<()> {
        let mut buf = Vec::new();

        HandshakeResponse {
            database: Some("shop"),
            max_packet_size: 1024,
            collation: 45,
            username: "tester",
            auth_plugin_name: Some("mysql_native_password"),
            auth_response: &[0xAA, 0xBB],
        }
        .encode_with(&mut buf, Capabilities::client(true))?;

        assert_eq!(&buf[..4], &0x0128_a30d_u32.to_le_bytes());
        assert_eq!(&buf[4..9], b"\x00\x04\x00\x00\x2d");
        assert_eq!(&buf[9..32], &[0; 23]);
        assert_eq!(&buf[32..], b"tester\0\x02\xAA\xBBshop\0mysql_native_password\0");

        Ok(())
    }

    #[test]
    fn it_drops_plugin_auth_without_a_plugin() -> anyhow::Result<()> {
        let mut buf = Vec::new();

        HandshakeResponse {
            database: None,
            max_packet_size: 1024,
            collation: 45,
            username: "tester",
            auth_plugin_name: None,
            auth_response: &[],
        }
        .encode_with(&mut buf, Capabilities::client(false))?;

        let flags = Capabilities::from_bits_truncate(u64::from(u32::from_le_bytes([
            buf[0], buf[1], buf[2], buf[3],
        ])));

        assert!(!flags.contains(Capabilities::PLUGIN_AUTH));
        assert!(!flags.contains(Capabilities::CONNECT_WITH_DB));
        assert_eq!(&buf[32..], b"tester\0\0");

        Ok(())
    }
}
