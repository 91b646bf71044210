use std::num::Saturating;

use crate::error::Error;
use crate::message::{FrontendMessage, FrontendMessageFormat};

/// Closes the current extended-query transaction; the server answers with
/// `ReadyForQuery` once everything before it has been processed.
#[derive(Debug)]
pub(crate) struct Sync;

impl FrontendMessage for Sync {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Sync;

    #[inline(always)]
    fn body_size_hint(&self) -> Saturating<usize> {
        Saturating(0)
    }

    #[inline(always)]
    fn encode_body(&self, _buf: &mut Vec<u8>) -> Result<(), Error> {
        Ok(())
    }
}

#[test]
fn test_encode_sync() {
    let mut buf = Vec::new();

    Sync.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, b"S\0\0\0\x04");
}
