use crate::error::Result;
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

// https://mariadb.com/kb/en/com_stmt_close/

#[derive(Debug)]
pub(crate) struct StmtClose {
    pub(crate) statement: u32,
}

impl ProtocolEncode<'_, Capabilities> for StmtClose {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<()> {
        buf.push(0x19); // COM_STMT_CLOSE
        buf.extend(&self.statement.to_le_bytes());

        Ok(())
    }
}

#[test]
fn test_encode_stmt_close() -> anyhow::Result<()> {
    let mut buf = Vec::new();
    StmtClose { statement: 7 }.encode_with(&mut buf, Capabilities::empty())?;

    assert_eq!(&buf[..], b"\x19\x07\x00\x00\x00");

    Ok(())
}
