use std::num::Saturating;

use crate::error::Error;
use crate::io::{BufMutExt, PgBufMutExt, StatementId};
use crate::message::{FrontendMessage, FrontendMessageFormat};

/// Parses `query` into a prepared statement. Parameter types are left for the
/// server to infer.
#[derive(Debug)]
pub(crate) struct Parse<'a> {
    /// The ID of the destination prepared statement.
    pub(crate) statement: StatementId,

    /// The query string to be parsed.
    pub(crate) query: &'a str,
}

impl FrontendMessage for Parse<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Parse;

    fn body_size_hint(&self) -> Saturating<usize> {
        let mut size = Saturating(0);

        size += self.statement.name_len();

        size += self.query.len();
        size += 1; // NUL terminator

        size += 2; // param_types_len

        size
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_statement_name(self.statement);

        buf.put_str_nul(self.query);

        // no parameter types are specified up front
        buf.extend(0_u16.to_be_bytes());

        Ok(())
    }
}

#[test]
fn test_encode_parse() {
    const EXPECTED: &[u8] = b"P\0\0\0\x25tessera_s_1234567890\0SELECT $1\0\0\0";

    let mut buf = Vec::new();
    let m = Parse {
        statement: StatementId::TEST_VAL,
        query: "SELECT $1",
    };

    m.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}

#[test]
fn test_encode_parse_unnamed_statement() {
    const EXPECTED: &[u8] = b"P\0\0\0\x11\0SELECT $1\0\0\0";

    let mut buf = Vec::new();
    let m = Parse {
        statement: StatementId::UNNAMED,
        query: "SELECT $1",
    };

    m.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}
