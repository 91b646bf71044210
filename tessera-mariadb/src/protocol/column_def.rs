use bytes::{Buf, Bytes};

use crate::error::Result;
use crate::io::{MariaDbBufExt, ProtocolDecode};
use crate::protocol::column_flags::ColumnFlags;
use crate::protocol::field_type::FieldType;

// binary "charset" that marks BLOB/BINARY/VARBINARY columns
const BINARY_CHARSET: u16 = 63;

/// Describes a column in the result set.
///
/// <https://mariadb.com/kb/en/result-set-packets/#column-definition-packet>
#[derive(Debug)]
pub(crate) struct ColumnDefinition {
    pub(crate) alias: String,
    pub(crate) name: String,
    pub(crate) charset: u16,
    pub(crate) ty: FieldType,
    pub(crate) flags: ColumnFlags,
}

impl ColumnDefinition {
    /// The label of this column in a result row.
    pub(crate) fn label(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    pub(crate) fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED)
    }

    pub(crate) fn is_binary(&self) -> bool {
        self.ty.is_blob_family() && self.charset == BINARY_CHARSET
    }
}

impl ProtocolDecode<'_> for ColumnDefinition {
    fn decode_with(mut buf: Bytes, _: ()) -> Result<Self> {
        // we are told that this is always "def"
        let _catalog = buf.get_bytes_lenenc()?;
        let _schema = buf.get_bytes_lenenc()?;
        let _table_alias = buf.get_bytes_lenenc()?;
        let _table = buf.get_bytes_lenenc()?;

        let alias = buf.get_str_lenenc()?;
        let name = buf.get_str_lenenc()?;

        // length of the fixed fields; always 0x0c
        let _ = buf.get_uint_lenenc()?;

        if buf.remaining() < 10 {
            return Err(err_protocol!(
                "column definition for {alias:?} is truncated"
            ));
        }

        let charset = buf.get_u16_le();
        let _max_size = buf.get_u32_le();
        let ty = FieldType(buf.get_u8());
        let flags = ColumnFlags::from_bits_truncate(buf.get_u16_le());

        Ok(Self {
            alias,
            name,
            charset,
            ty,
            flags,
        })
    }
}
