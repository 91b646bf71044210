use crate::error::Result;
use crate::io::ProtocolEncode;
use crate::protocol::Capabilities;

// https://mariadb.com/kb/en/com_quit/

#[derive(Debug)]
pub(crate) struct Quit;

impl ProtocolEncode<'_, Capabilities> for Quit {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<()> {
        buf.push(0x01); // COM_QUIT

        Ok(())
    }
}
