use bytes::{Buf, Bytes};
use tessera_core::io::BufExt;

use crate::error::Result;

pub trait MariaDbBufExt: Buf {
    // Read a length-encoded integer.
    // NOTE: 0xfb or NULL is only returned for text value encoding to indicate NULL.
    // NOTE: 0xff is only returned during a result set to indicate ERR.
    // <https://mariadb.com/kb/en/protocol-data-types/#length-encoded-integers>
    fn get_uint_lenenc(&mut self) -> Result<u64>;

    // Read a length-encoded string.
    fn get_str_lenenc(&mut self) -> Result<String>;

    // Read a length-encoded byte sequence.
    fn get_bytes_lenenc(&mut self) -> Result<Bytes>;
}

fn ensure(buf: &Bytes, len: usize) -> Result<()> {
    if buf.remaining() < len {
        return Err(err_protocol!(
            "expected {len} bytes but only {} remain",
            buf.remaining()
        ));
    }

    Ok(())
}

impl MariaDbBufExt for Bytes {
    fn get_uint_lenenc(&mut self) -> Result<u64> {
        ensure(self, 1)?;

        Ok(match self.get_u8() {
            0xfc => {
                ensure(self, 2)?;
                u64::from(self.get_u16_le())
            }

            0xfd => {
                ensure(self, 3)?;
                self.get_uint_le(3)
            }

            0xfe => {
                ensure(self, 8)?;
                self.get_u64_le()
            }

            v => u64::from(v),
        })
    }

    fn get_str_lenenc(&mut self) -> Result<String> {
        let size = self.get_uint_lenenc()?;
        let size = usize::try_from(size)
            .map_err(|_| err_protocol!("string length overflows usize: {size}"))?;

        self.get_str(size)
    }

    fn get_bytes_lenenc(&mut self) -> Result<Bytes> {
        let size = self.get_uint_lenenc()?;
        let size = usize::try_from(size)
            .map_err(|_| err_protocol!("string length overflows usize: {size}"))?;

        BufExt::get_bytes(self, size)
    }
}
