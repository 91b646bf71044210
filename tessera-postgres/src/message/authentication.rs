use std::str::from_utf8;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use bytes::{Buf, Bytes};
use memchr::memchr;

use crate::error::Error;
use crate::io::ProtocolDecode;
use crate::message::{BackendMessage, BackendMessageFormat};

// On startup, the server sends an appropriate authentication request message,
// to which the frontend must reply with an appropriate authentication
// response message (such as a password).

// For all authentication methods except GSSAPI, SSPI and SASL, there is at
// most one request and one response. In some methods, no response at all is
// needed from the frontend, and so no authentication request occurs.

// For SASL, multiple exchanges of packets may be needed to complete the
// authentication.

// <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-START-UP>

#[derive(Debug)]
pub(crate) enum Authentication {
    /// The authentication exchange is successfully completed.
    Ok,

    /// The frontend must now send a [`Password`](super::Password) message
    /// containing the password in clear-text form.
    CleartextPassword,

    /// The frontend must now send a [`Password`](super::Password) message
    /// containing the password (with user name) encrypted via MD5, then
    /// encrypted again using the 4-byte random salt.
    Md5Password { salt: [u8; 4] },

    /// The frontend must now initiate a SASL negotiation,
    /// using one of the SASL mechanisms listed in the message.
    Sasl(AuthenticationSasl),

    /// This message contains challenge data from the previous step of SASL negotiation.
    SaslContinue(AuthenticationSaslContinue),

    /// SASL authentication has completed with additional mechanism-specific
    /// data for the client.
    SaslFinal(AuthenticationSaslFinal),

    /// Any method we cannot answer: Kerberos, SCM, GSSAPI or SSPI.
    Unsupported(u32),
}

impl BackendMessage for Authentication {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::Authentication;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 4 {
            return Err(err_protocol!("expected at least 4 bytes, got {}", buf.len()));
        }

        Ok(match buf.get_u32() {
            0 => Authentication::Ok,

            3 => Authentication::CleartextPassword,

            5 => {
                if buf.len() != 4 {
                    return Err(err_protocol!(
                        "expected 4 bytes of MD5 salt, got {}",
                        buf.len()
                    ));
                }

                let mut salt = [0; 4];
                buf.copy_to_slice(&mut salt);

                Authentication::Md5Password { salt }
            }

            10 => Authentication::Sasl(AuthenticationSasl(buf)),
            11 => Authentication::SaslContinue(AuthenticationSaslContinue::decode(buf)?),
            12 => Authentication::SaslFinal(AuthenticationSaslFinal::decode(buf)?),

            ty @ (2 | 6 | 7 | 8 | 9) => Authentication::Unsupported(ty),

            ty => {
                return Err(err_protocol!("unknown authentication method: {ty}"));
            }
        })
    }
}

/// Body of [`Authentication::Sasl`].
#[derive(Debug)]
pub(crate) struct AuthenticationSasl(Bytes);

impl AuthenticationSasl {
    #[inline]
    pub(crate) fn mechanisms(&self) -> SaslMechanisms<'_> {
        SaslMechanisms(&self.0)
    }
}

/// An iterator over the SASL authentication mechanisms provided by the server.
pub(crate) struct SaslMechanisms<'a>(&'a [u8]);

impl<'a> Iterator for SaslMechanisms<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.first().map_or(true, |&b| b == b'\0') {
            return None;
        }

        let mechanism = memchr(b'\0', self.0).and_then(|nul| from_utf8(&self.0[..nul]).ok())?;

        self.0 = &self.0[(mechanism.len() + 1)..];

        Some(mechanism)
    }
}

#[derive(Debug)]
pub(crate) struct AuthenticationSaslContinue {
    pub(crate) salt: Vec<u8>,
    pub(crate) iterations: u32,
    pub(crate) nonce: String,
    pub(crate) message: String,
}

impl ProtocolDecode<'_> for AuthenticationSaslContinue {
    fn decode_with(buf: Bytes, _: ()) -> Result<Self, Error> {
        let mut iterations: u32 = 4096;
        let mut salt = Vec::new();
        let mut nonce = Bytes::new();

        // [Example]
        // r=/z+giZiTxAH7r8sNAeHr7cvpqV3uo7G/bJBIJO3pjVM7t3ng,s=4UV68bIkC8f9/X8xH7aPhg==,i=4096

        for item in buf.split(|b| *b == b',') {
            if item.len() < 2 || item[1] != b'=' {
                continue;
            }

            let value = &item[2..];

            match item[0] {
                b'r' => {
                    nonce = buf.slice_ref(value);
                }

                b'i' => {
                    iterations = atoi::atoi(value).unwrap_or(4096);
                }

                b's' => {
                    salt = BASE64_STANDARD.decode(value).map_err(Error::protocol)?;
                }

                _ => {}
            }
        }

        Ok(Self {
            iterations,
            salt,
            nonce: from_utf8(&nonce).map_err(Error::protocol)?.to_owned(),
            message: from_utf8(&buf).map_err(Error::protocol)?.to_owned(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct AuthenticationSaslFinal {
    pub(crate) verifier: Vec<u8>,
}

impl ProtocolDecode<'_> for AuthenticationSaslFinal {
    fn decode_with(buf: Bytes, _: ()) -> Result<Self, Error> {
        let mut verifier = Vec::new();

        for item in buf.split(|b| *b == b',') {
            if let Some(value) = item.strip_prefix(b"v=") {
                verifier = BASE64_STANDARD.decode(value).map_err(Error::protocol)?;
            }
        }

        Ok(Self { verifier })
    }
}

#[test]
fn test_decode_auth_ok() {
    let m = Authentication::decode_body(Bytes::from_static(b"\0\0\0\0")).unwrap();

    assert!(matches!(m, Authentication::Ok));
}

#[test]
fn test_decode_auth_md5() {
    const DATA: &[u8] = b"\0\0\0\x05\xccSZ\x7f";

    let m = Authentication::decode_body(Bytes::from_static(DATA)).unwrap();

    assert!(matches!(
        m,
        Authentication::Md5Password {
            salt: [204, 83, 90, 127],
        }
    ));
}

#[test]
fn test_decode_auth_sasl() {
    const DATA: &[u8] = b"\0\0\0\x0aSCRAM-SHA-256-PLUS\0SCRAM-SHA-256\0\0";

    let Authentication::Sasl(sasl) = Authentication::decode_body(Bytes::from_static(DATA)).unwrap()
    else {
        panic!("expected SASL");
    };

    assert_eq!(
        sasl.mechanisms().collect::<Vec<_>>(),
        ["SCRAM-SHA-256-PLUS", "SCRAM-SHA-256"]
    );
}

#[test]
fn test_decode_auth_sasl_continue() {
    const DATA: &[u8] = b"\0\0\0\x0br=/z+giZiTxAH7r8sNAeHr7cvpqV3uo7G/bJBIJO3pjVM7t3ng,s=4UV68bIkC8f9/X8xH7aPhg==,i=4096";

    let Authentication::SaslContinue(cont) =
        Authentication::decode_body(Bytes::from_static(DATA)).unwrap()
    else {
        panic!("expected SASLContinue");
    };

    assert_eq!(cont.iterations, 4096);
    assert_eq!(cont.nonce, "/z+giZiTxAH7r8sNAeHr7cvpqV3uo7G/bJBIJO3pjVM7t3ng");
    assert_eq!(cont.salt.len(), 16);
    assert_eq!(&cont.message, std::str::from_utf8(&DATA[4..]).unwrap());
}

#[test]
fn test_decode_auth_unsupported() {
    let m = Authentication::decode_body(Bytes::from_static(b"\0\0\0\x07")).unwrap();
    assert!(matches!(m, Authentication::Unsupported(7)));

    assert!(Authentication::decode_body(Bytes::from_static(b"\0\0\0\x63")).is_err());
}
