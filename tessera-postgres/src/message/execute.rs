use std::num::Saturating;

use crate::error::Error;
use crate::message::{FrontendMessage, FrontendMessageFormat};

/// Runs the unnamed portal created by the preceding `Bind`.
#[derive(Debug)]
pub(crate) struct Execute {
    /// Maximum number of rows to return, if portal contains a query
    /// that returns rows (ignored otherwise). Zero denotes “no limit”.
    pub(crate) limit: u32,
}

impl FrontendMessage for Execute {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Execute;

    fn body_size_hint(&self) -> Saturating<usize> {
        // unnamed portal, then the limit
        Saturating(1 + 4)
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(0);
        buf.extend(&self.limit.to_be_bytes());

        Ok(())
    }
}

#[test]
fn test_encode_execute_unnamed_portal() {
    const EXPECTED: &[u8] = b"E\0\0\0\x09\0\x49\x96\x02\xD2";

    let mut buf = Vec::new();
    let m = Execute { limit: 1234567890 };

    m.encode_msg(&mut buf).unwrap();

    assert_eq!(buf, EXPECTED);
}
