use bytes::buf::Chain;
use bytes::{Buf, Bytes};
use memchr::memchr;

use crate::error::Result;
use crate::io::{BufExt, ProtocolDecode};
use crate::protocol::response::Status;
use crate::protocol::Capabilities;

// https://mariadb.com/kb/en/connection/#initial-handshake-packet
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_v10.html

#[derive(Debug)]
pub(crate) struct Handshake {
    #[allow(unused)]
    pub(crate) protocol_version: u8,
    pub(crate) server_version: String,
    pub(crate) connection_id: u32,
    pub(crate) server_capabilities: Capabilities,
    #[allow(unused)]
    pub(crate) server_default_collation: u8,
    #[allow(unused)]
    pub(crate) status: Status,
    pub(crate) auth_plugin_name: Option<String>,
    pub(crate) auth_plugin_data: Chain<Bytes, Bytes>,
}

impl ProtocolDecode<'_> for Handshake {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        let protocol_version = buf.first().copied().unwrap_or_default();
        if protocol_version != 10 {
            return Err(err_protocol!(
                "unsupported handshake protocol version {protocol_version}; expected 10"
            ));
        }

        buf.advance(1);

        let server_version = buf.get_str_nul()?;

        if buf.remaining() < 4 + 8 + 1 + 2 {
            return Err(err_protocol!("handshake packet is truncated"));
        }

        let connection_id = buf.get_u32_le();

        // scramble 1st part (authentication seed) : string<8>
        let auth_plugin_data_1 = buf.get_bytes(8)?;

        // reserved : string<1>
        buf.advance(1);

        // server capabilities (1st part) : int<2>
        let capabilities_1 = buf.get_u16_le();
        let mut capabilities = Capabilities::from_bits_truncate(capabilities_1.into());

        if buf.remaining() < 1 + 2 + 2 + 1 + 10 {
            // pre-4.1 servers end the packet here
            return Ok(Self {
                protocol_version,
                server_version,
                connection_id,
                server_capabilities: capabilities,
                server_default_collation: 0,
                status: Status::empty(),
                auth_plugin_name: None,
                auth_plugin_data: auth_plugin_data_1.chain(Bytes::new()),
            });
        }

        // server default collation : int<1>
        let server_default_collation = buf.get_u8();

        // status flags : int<2>
        let status = Status::from_bits_truncate(buf.get_u16_le());

        // server capabilities (2nd part) : int<2>
        let capabilities_2 = buf.get_u16_le();
        capabilities |= Capabilities::from_bits_truncate(u64::from(capabilities_2) << 16);

        // plugin data length : int<1>, or 0x00 without PLUGIN_AUTH
        let auth_plugin_data_len = buf.get_u8();

        // filler : string<6>
        // MariaDB extended capabilities or MySQL filler : int<4>
        buf.advance(10);

        let auth_plugin_data_2 = if capabilities.contains(Capabilities::SECURE_CONNECTION) {
            // scramble 2nd part . Length = max(12, plugin data length - 9) : string<N>
            let len = usize::from(auth_plugin_data_len).saturating_sub(9).max(12);
            let len = len.min(buf.remaining());

            let data = buf.get_bytes(len)?;

            // NUL-terminator
            if buf.has_remaining() {
                buf.advance(1);
            }

            data
        } else {
            Bytes::new()
        };

        let auth_plugin_name = if capabilities.contains(Capabilities::PLUGIN_AUTH) {
            // some servers omit the NUL-terminator of the last field
            Some(match memchr(b'\0', &buf) {
                Some(_) => buf.get_str_nul()?,
                None => String::from_utf8_lossy(&buf).into_owned(),
            })
        } else {
            None
        };

        Ok(Self {
            protocol_version,
            server_version,
            connection_id,
            server_capabilities: capabilities,
            server_default_collation,
            status,
            auth_plugin_name,
            auth_plugin_data: auth_plugin_data_1.chain(auth_plugin_data_2),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Buf;

    use super::{Capabilities, Handshake, ProtocolDecode, Status};

    const HANDSHAKE_MARIA_DB_10_5_8: &[u8] = b"\n5.5.5-10.5.8-MariaDB-1:10.5.8+maria~focal\0)\0\0\04bo+$r4H\0\xfe\xf7-\x02\0\xff\x81\x15\0\0\0\0\0\0\x0f\0\0\0O5X>j}Ur]Y)^\0mysql_native_password\0";
    const HANDSHAKE_MYSQL_8_0_22: &[u8] = b"\n8.0.22\0\x08\0\0\0TIbl}%U#\0\xff\xff\xff\x02\0\xff\xc7\x15\0\0\0\0\0\0\0\0\0\0\x06\x12\x0e`5\x1b\x12\x0b\x13\x06_\x19\0caching_sha2_password\0";

    fn nonce(handshake: &Handshake) -> Vec<u8> {
        let data = &handshake.auth_plugin_data;

        let mut nonce = data.first_ref().to_vec();
        nonce.extend_from_slice(data.last_ref());
        nonce
    }

    #[test]
    fn it_decodes_mariadb_handshake() -> anyhow::Result<()> {
        let handshake = Handshake::decode(HANDSHAKE_MARIA_DB_10_5_8.into())?;

        assert_eq!(handshake.protocol_version, 10);
        assert_eq!(handshake.server_version, "5.5.5-10.5.8-MariaDB-1:10.5.8+maria~focal");
        assert_eq!(handshake.connection_id, 41);
        assert_eq!(handshake.server_default_collation, 45);
        assert!(handshake.status.contains(Status::AUTOCOMMIT));

        // MariaDB clears LONG_PASSWORD to announce its extended capabilities
        assert!(!handshake.server_capabilities.contains(Capabilities::LONG_PASSWORD));
        assert!(handshake.server_capabilities.contains(
            Capabilities::PROTOCOL_41
                | Capabilities::SECURE_CONNECTION
                | Capabilities::PLUGIN_AUTH
                | Capabilities::DEPRECATE_EOF
        ));

        assert_eq!(handshake.auth_plugin_name.as_deref(), Some("mysql_native_password"));
        assert_eq!(nonce(&handshake), b"4bo+$r4HO5X>j}Ur]Y)^");
        assert_eq!(handshake.auth_plugin_data.remaining(), 20);

        Ok(())
    }

    #[test]
    fn it_decodes_mysql_handshake() -> anyhow::Result<()> {
        let handshake = Handshake::decode(HANDSHAKE_MYSQL_8_0_22.into())?;

        assert_eq!(handshake.server_version, "8.0.22");
        assert_eq!(handshake.connection_id, 8);
        assert!(handshake.server_capabilities.contains(Capabilities::LONG_PASSWORD));
        assert_eq!(handshake.auth_plugin_name.as_deref(), Some("caching_sha2_password"));
        assert_eq!(nonce(&handshake), b"TIbl}%U#\x06\x12\x0e`5\x1b\x12\x0b\x13\x06_\x19");

        Ok(())
    }

    #[test]
    fn it_rejects_unknown_protocol_versions() {
        assert!(Handshake::decode((&b"\x09old\0"[..]).into()).is_err());
        assert!(Handshake::decode(bytes::Bytes::new()).is_err());
    }
}
