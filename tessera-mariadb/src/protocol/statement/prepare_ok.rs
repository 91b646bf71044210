use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::io::ProtocolDecode;

/// Response from a successful `COM_STMT_PREPARE`.
///
/// <https://mariadb.com/kb/en/com_stmt_prepare/#com_stmt_prepare_ok>
#[derive(Debug)]
pub(crate) struct PrepareOk {
    pub(crate) statement_id: u32,
    pub(crate) columns: u16,
    pub(crate) params: u16,
    pub(crate) warnings: u16,
}

impl ProtocolDecode<'_> for PrepareOk {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        const SIZE: usize = 12;

        if buf.len() < SIZE {
            return Err(err_protocol!(
                "PrepareOk expected {SIZE} bytes but got {}",
                buf.len()
            ));
        }

        let status = buf.get_u8();
        if status != 0x00 {
            return Err(err_protocol!(
                "expected 0x00 (COM_STMT_PREPARE_OK) but found 0x{status:02x}"
            ));
        }

        let statement_id = buf.get_u32_le();
        let columns = buf.get_u16_le();
        let params = buf.get_u16_le();

        buf.advance(1); // reserved: string<1>

        let warnings = buf.get_u16_le();

        Ok(Self {
            statement_id,
            columns,
            params,
            warnings,
        })
    }
}

#[test]
fn test_decode_prepare_ok() -> anyhow::Result<()> {
    const DATA: &[u8] = b"\x00\x01\x00\x00\x00\x02\x00\x03\x00\x00\x00\x00";

    let ok = PrepareOk::decode(DATA.into())?;

    assert_eq!(ok.statement_id, 1);
    assert_eq!(ok.columns, 2);
    assert_eq!(ok.params, 3);
    assert_eq!(ok.warnings, 0);

    assert!(PrepareOk::decode((&DATA[..6]).into()).is_err());

    Ok(())
}
