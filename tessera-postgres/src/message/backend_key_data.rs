use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::message::{BackendMessage, BackendMessageFormat};

/// Contains cancellation key data; only the process ID is kept.
#[derive(Debug)]
pub(crate) struct BackendKeyData {
    /// The process ID of this database.
    pub(crate) process_id: u32,
}

impl BackendMessage for BackendKeyData {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::BackendKeyData;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 8 {
            return Err(err_protocol!("expected 8 bytes, got {}", buf.len()));
        }

        let process_id = buf.get_u32();
        // only needed for `CancelRequest`, which is never sent
        let _secret_key = buf.get_u32();

        Ok(Self { process_id })
    }
}

#[test]
fn test_decode_backend_key_data() {
    const DATA: &[u8] = b"\0\0'\xc6\x89R\xc5+";

    let m = BackendKeyData::decode_body(DATA.into()).unwrap();

    assert_eq!(m.process_id, 10182);
}
