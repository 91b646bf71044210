use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::message::{BackendMessage, BackendMessageFormat};

/// The parameter type OIDs of a described statement.
#[derive(Debug)]
pub(crate) struct ParameterDescription {
    pub(crate) types: Vec<u32>,
}

impl BackendMessage for ParameterDescription {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::ParameterDescription;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 2 {
            return Err(err_protocol!("expected at least 2 bytes, got {}", buf.len()));
        }

        let cnt = usize::from(buf.get_u16());

        if buf.len() != cnt * 4 {
            return Err(err_protocol!(
                "expected {cnt} parameter types, got {} bytes",
                buf.len()
            ));
        }

        let types = (0..cnt).map(|_| buf.get_u32()).collect();

        Ok(Self { types })
    }
}

#[test]
fn test_decode_parameter_description() {
    const DATA: &[u8] = b"\x00\x02\x00\x00\x00\x00\x00\x00\x05\x00";

    let m = ParameterDescription::decode_body(DATA.into()).unwrap();

    assert_eq!(m.types, [0x0000_0000, 0x0000_0500]);
}

#[test]
fn test_decode_empty_parameter_description() {
    const DATA: &[u8] = b"\x00\x00";

    let m = ParameterDescription::decode_body(DATA.into()).unwrap();

    assert!(m.types.is_empty());
}
