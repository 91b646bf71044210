use std::result::Result as StdResult;
use std::str::from_utf8;

use tessera_core::{Row, Value};

use crate::error::{BoxDynError, Error, Result};
use crate::message::{DataRow, Field};

// https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat
const BOOL: u32 = 16;
const BYTEA: u32 = 17;
const INT8: u32 = 20;
const INT2: u32 = 21;
const INT4: u32 = 23;
const FLOAT4: u32 = 700;
const FLOAT8: u32 = 701;

/// Converts a text-format `DataRow` into a [`Row`], picking each value's
/// type from the column's type OID.
pub(crate) fn decode_row(fields: &[Field], data: DataRow) -> Result<Row> {
    if data.values.len() != fields.len() {
        return Err(err_protocol!(
            "expected {} columns in DataRow, got {}",
            fields.len(),
            data.values.len()
        ));
    }

    let mut row = Row::with_capacity(fields.len());

    for (field, value) in fields.iter().zip(data.values) {
        let value = match value {
            None => Value::Null,

            Some(cell) => decode_cell(field.type_id, &cell)
                .map_err(|err| Error::decode(&field.name, err))?,
        };

        row.add(field.name.as_str(), value);
    }

    Ok(row)
}

fn decode_cell(type_id: u32, cell: &[u8]) -> StdResult<Value, BoxDynError> {
    match type_id {
        BOOL => match cell {
            b"t" | b"1" | b"true" => Ok(Value::Boolean(true)),
            b"f" | b"0" | b"false" => Ok(Value::Boolean(false)),

            _ => Err(format!("invalid boolean {:?}", String::from_utf8_lossy(cell)).into()),
        },

        INT2 | INT4 | INT8 => {
            let v: i64 = from_utf8(cell)?.parse()?;

            Ok(match i32::try_from(v) {
                Ok(v) => Value::Integer(v),
                Err(_) => Value::LongInteger(v),
            })
        }

        FLOAT4 | FLOAT8 => Ok(Value::Double(from_utf8(cell)?.parse()?)),

        BYTEA => decode_bytea(cell).map(Value::Blob),

        _ => Ok(Value::Text(from_utf8(cell)?.to_owned())),
    }
}

// https://www.postgresql.org/docs/current/datatype-binary.html
fn decode_bytea(cell: &[u8]) -> StdResult<Vec<u8>, BoxDynError> {
    if let Some(hex) = cell.strip_prefix(b"\\x") {
        return Ok(hex::decode(hex)?);
    }

    // the legacy escape format, used when `bytea_output = 'escape'`
    let mut out = Vec::with_capacity(cell.len());
    let mut rest = cell;

    while let Some((&b, tail)) = rest.split_first() {
        if b != b'\\' {
            out.push(b);
            rest = tail;
            continue;
        }

        match tail {
            [b'\\', tail @ ..] => {
                out.push(b'\\');
                rest = tail;
            }

            [a @ b'0'..=b'3', b @ b'0'..=b'7', c @ b'0'..=b'7', tail @ ..] => {
                out.push((a - b'0') << 6 | (b - b'0') << 3 | (c - b'0'));
                rest = tail;
            }

            _ => return Err("invalid escape sequence in bytea value".into()),
        }
    }

    Ok(out)
}
