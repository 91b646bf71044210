use std::num::Saturating;

use crate::error::Error;
use crate::io::{PgBufMutExt, StatementId};
use crate::message::{FrontendMessage, FrontendMessageFormat};

const DESCRIBE_STATEMENT: u8 = b'S';

/// Asks for the `ParameterDescription` and `RowDescription` (or `NoData`)
/// of a prepared statement.
#[derive(Debug)]
pub(crate) struct Describe(pub(crate) StatementId);

impl FrontendMessage for Describe {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Describe;

    fn body_size_hint(&self) -> Saturating<usize> {
        Saturating(1) + self.0.name_len()
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(DESCRIBE_STATEMENT);
        buf.put_statement_name(self.0);

        Ok(())
    }
}

#[test]
fn test_encode_describe_statement() {
    const EXPECTED: &[u8] = b"D\0\0\0\x1aStessera_s_1234567890\0";

    let mut buf = Vec::new();
    let m = Describe(StatementId::TEST_VAL);

    m.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}

#[test]
fn test_encode_describe_unnamed_statement() {
    const EXPECTED: &[u8] = b"D\0\0\0\x06S\0";

    let mut buf = Vec::new();
    let m = Describe(StatementId::UNNAMED);

    m.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}
