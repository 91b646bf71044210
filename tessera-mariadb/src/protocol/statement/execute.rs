use tessera_core::Value;

use crate::error::Result;
use crate::io::{MariaDbBufMutExt, ProtocolEncode};
use crate::protocol::field_type::{FieldType, TypeFlag};
use crate::protocol::Capabilities;

const NO_CURSOR: u8 = 0;

/// Asks the server to execute a prepared statement as identified.
///
/// Parameters without a bound argument are sent as `NULL`.
///
/// <https://mariadb.com/kb/en/com_stmt_execute/>
#[derive(Debug)]
pub(crate) struct Execute<'a> {
    pub(crate) statement: u32,
    pub(crate) params: u16,
    pub(crate) arguments: &'a [Value],
}

impl ProtocolEncode<'_, Capabilities> for Execute<'_> {
    fn encode_with(&self, buf: &mut Vec<u8>, _: Capabilities) -> Result<()> {
        buf.push(0x17); // COM_STMT_EXECUTE
        buf.extend(&self.statement.to_le_bytes());
        buf.push(NO_CURSOR);

        // number of times to execute the statement; can only be 1
        buf.extend(&1_u32.to_le_bytes());

        let params = usize::from(self.params);

        if params == 0 {
            return Ok(());
        }

        let arguments = (0..params).map(|index| self.arguments.get(index).unwrap_or(&Value::Null));

        let null_bitmap_offset = buf.len();
        buf.resize(null_bitmap_offset + (params + 7) / 8, 0);

        for (index, value) in arguments.clone().enumerate() {
            if value.is_null() {
                buf[null_bitmap_offset + index / 8] |= 1 << (index % 8);
            }
        }

        // send types to server
        buf.push(1);

        for value in arguments.clone() {
            let (ty, flag) = type_of(value);

            buf.push(ty.0);
            buf.push(flag.to_byte());
        }

        for value in arguments {
            encode_value(buf, value);
        }

        Ok(())
    }
}

fn type_of(value: &Value) -> (FieldType, TypeFlag) {
    match value {
        Value::Null => (FieldType::NULL, TypeFlag::Signed),
        Value::Integer(_) => (FieldType::LONG, TypeFlag::Signed),
        Value::UnsignedInteger(_) => (FieldType::LONG, TypeFlag::Unsigned),
        Value::LongInteger(_) => (FieldType::LONGLONG, TypeFlag::Signed),
        Value::UnsignedLongInteger(_) => (FieldType::LONGLONG, TypeFlag::Unsigned),
        Value::Double(_) => (FieldType::DOUBLE, TypeFlag::Signed),
        Value::Text(_) => (FieldType::STRING, TypeFlag::Signed),
        Value::Blob(_) => (FieldType::BLOB, TypeFlag::Signed),
        Value::Boolean(_) => (FieldType::TINY, TypeFlag::Signed),
    }
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        // only flagged in the null bitmap
        Value::Null => {}
        Value::Integer(v) => buf.extend(&v.to_le_bytes()),
        Value::UnsignedInteger(v) => buf.extend(&v.to_le_bytes()),
        Value::LongInteger(v) => buf.extend(&v.to_le_bytes()),
        Value::UnsignedLongInteger(v) => buf.extend(&v.to_le_bytes()),
        Value::Double(v) => buf.extend(&v.to_le_bytes()),
        Value::Text(v) => buf.put_str_lenenc(v),
        Value::Blob(v) => buf.put_bytes_lenenc(v),
        Value::Boolean(v) => buf.push(u8::from(*v)),
    }
}
