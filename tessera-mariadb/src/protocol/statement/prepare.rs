use crate::error::Result;
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

// https://mariadb.com/kb/en/com_stmt_prepare/

#[derive(Debug)]
pub(crate) struct Prepare<'a> {
    pub(crate) query: &'a str,
}

impl ProtocolEncode<'_, Capabilities> for Prepare<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<()> {
        buf.push(0x16); // COM_STMT_PREPARE
        buf.extend(self.query.as_bytes());

        Ok(())
    }
}
