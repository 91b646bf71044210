use crate::error::Error;
use crate::io::{BufMutExt, PgBufMutExt, ProtocolEncode};

/// The first message of a connection. It has no format code, so it is
/// encoded outside of [`FrontendMessage`](super::FrontendMessage).
///
/// <https://www.postgresql.org/docs/current/protocol-message-formats.html#PROTOCOL-MESSAGE-FORMATS-STARTUPMESSAGE>
#[derive(Debug)]
pub(crate) struct Startup<'a> {
    /// The database user name to connect as. Required; there is no default.
    pub(crate) username: Option<&'a str>,

    /// The database to connect to. Defaults to the user name.
    pub(crate) database: Option<&'a str>,

    /// Additional start-up params.
    /// <https://www.postgresql.org/docs/devel/runtime-config-client.html>
    pub(crate) params: &'a [(&'a str, &'a str)],
}

// Startup cannot impl FrontendMessage because it doesn't have a format code.
impl ProtocolEncode<'_> for Startup<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _context: ()) -> Result<(), Error> {
        buf.reserve(120);

        buf.put_length_prefixed(|buf| {
            // The protocol version number. The most significant 16 bits are the
            // major version number (3 for the protocol described here). The least
            // significant 16 bits are the minor version number (0
            // for the protocol described here)
            buf.extend(&196_608_i32.to_be_bytes());

            if let Some(username) = self.username {
                // The database user name to connect as.
                encode_startup_param(buf, "user", username);
            }

            if let Some(database) = self.database {
                // The database to connect to. Defaults to the user name.
                encode_startup_param(buf, "database", database);
            }

            for (name, value) in self.params {
                encode_startup_param(buf, name, value);
            }

            // A zero byte is required as a terminator
            // after the last name/value pair.
            buf.push(0);

            Ok(())
        })
    }
}

#[inline]
fn encode_startup_param(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.put_str_nul(name);
    buf.put_str_nul(value);
}

#[test]
fn test_encode_startup() {
    const EXPECTED: &[u8] = b"\0\0\0)\0\x03\0\0user\0postgres\0database\0postgres\0\0";

    let mut buf = Vec::new();
    let m = Startup {
        username: Some("postgres"),
        database: Some("postgres"),
        params: &[],
    };

    m.encode(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}

#[test]
fn test_encode_startup_with_params() {
    let mut buf = Vec::new();
    let m = Startup {
        username: Some("shop"),
        database: None,
        params: &[("client_encoding", "UTF8")],
    };

    m.encode(&mut buf).unwrap();

    assert_eq!(
        buf,
        b"\0\0\0\x28\0\x03\0\0user\0shop\0client_encoding\0UTF8\0\0"
    );
}
