use std::num::Saturating;

use crate::error::Error;
use crate::io::{PgBufMutExt, StatementId};
use crate::message::{FrontendMessage, FrontendMessageFormat};

const CLOSE_STATEMENT: u8 = b'S';

/// Deallocates a prepared statement on the server.
#[derive(Debug)]
pub(crate) struct Close(pub(crate) StatementId);

impl FrontendMessage for Close {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Close;

    fn body_size_hint(&self) -> Saturating<usize> {
        Saturating(1) + self.0.name_len()
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(CLOSE_STATEMENT);
        buf.put_statement_name(self.0);

        Ok(())
    }
}

#[test]
fn test_encode_close_statement() {
    const EXPECTED: &[u8] = b"C\0\0\0\x1aStessera_s_1234567890\0";

    let mut buf = Vec::new();

    Close(StatementId::TEST_VAL).encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}
