use std::fmt::Write as _;
use std::result::Result as StdResult;
use std::str::{from_utf8, FromStr};

use bytes::{Buf, Bytes};
use tessera_core::{Row, Value};

use crate::error::{BoxDynError, Error, Result};
use crate::io::{BufExt, MariaDbBufExt};
use crate::protocol::column_def::ColumnDefinition;
use crate::protocol::field_type::FieldType;

// a text-protocol cell starting with 0xfb is NULL
const NULL_CELL: u8 = 0xfb;

/// Decodes a row of the text protocol (`COM_QUERY`), where every non-null
/// cell is a length-encoded string.
///
/// <https://mariadb.com/kb/en/resultset-row/#text-resultset-row>
pub(crate) fn decode_text_row(mut buf: Bytes, columns: &[ColumnDefinition]) -> Result<Row> {
    let mut row = Row::with_capacity(columns.len());

    for column in columns {
        let value = if buf.first() == Some(&NULL_CELL) {
            buf.advance(1);
            Value::Null
        } else {
            let cell = buf.get_bytes_lenenc()?;
            decode_text_cell(column, cell).map_err(|err| Error::decode(column.label(), err))?
        };

        row.add(column.label(), value);
    }

    Ok(row)
}

fn decode_text_cell(column: &ColumnDefinition, cell: Bytes) -> StdResult<Value, BoxDynError> {
    match column.ty {
        FieldType::NULL => Ok(Value::Null),

        FieldType::TINY | FieldType::SHORT | FieldType::INT24 | FieldType::LONG => {
            if column.is_unsigned() {
                parse(&cell).map(Value::UnsignedInteger)
            } else {
                parse(&cell).map(Value::Integer)
            }
        }

        FieldType::LONGLONG => {
            if column.is_unsigned() {
                parse(&cell).map(Value::UnsignedLongInteger)
            } else {
                parse(&cell).map(Value::LongInteger)
            }
        }

        FieldType::FLOAT | FieldType::DOUBLE | FieldType::DECIMAL | FieldType::NEWDECIMAL => {
            parse(&cell).map(Value::Double)
        }

        FieldType::BIT | FieldType::GEOMETRY => Ok(Value::Blob(cell.to_vec())),

        _ if column.is_binary() => Ok(Value::Blob(cell.to_vec())),

        _ => Ok(Value::Text(from_utf8(&cell)?.to_owned())),
    }
}

fn parse<T>(cell: &[u8]) -> StdResult<T, BoxDynError>
where
    T: FromStr,
    T::Err: Into<BoxDynError>,
{
    from_utf8(cell)?.parse().map_err(Into::into)
}

/// Decodes a row of the binary protocol (`COM_STMT_EXECUTE`).
///
/// <https://mariadb.com/kb/en/resultset-row/#binary-resultset-row>
pub(crate) fn decode_binary_row(mut buf: Bytes, columns: &[ColumnDefinition]) -> Result<Row> {
    let header = buf.first().copied();
    if header != Some(0x00) {
        return Err(err_protocol!(
            "expected 0x00 (binary row) but found {:?}",
            header
        ));
    }

    buf.advance(1);

    // the first two bits of the bitmap are reserved
    let null_bitmap = BufExt::get_bytes(&mut buf, (columns.len() + 9) / 8)?;

    let mut row = Row::with_capacity(columns.len());

    for (index, column) in columns.iter().enumerate() {
        let bit = index + 2;

        let value = if null_bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
            Value::Null
        } else {
            decode_binary_cell(column, &mut buf)?
        };

        row.add(column.label(), value);
    }

    Ok(row)
}

fn fixed<const N: usize>(buf: &mut Bytes) -> Result<[u8; N]> {
    let bytes = BufExt::get_bytes(buf, N)?;

    let mut out = [0; N];
    out.copy_from_slice(&bytes);

    Ok(out)
}

fn decode_binary_cell(column: &ColumnDefinition, buf: &mut Bytes) -> Result<Value> {
    let unsigned = column.is_unsigned();

    Ok(match column.ty {
        FieldType::NULL => Value::Null,

        FieldType::TINY if unsigned => Value::UnsignedInteger(u8::from_le_bytes(fixed(buf)?).into()),
        FieldType::TINY => Value::Integer(i8::from_le_bytes(fixed(buf)?).into()),

        FieldType::SHORT if unsigned => {
            Value::UnsignedInteger(u16::from_le_bytes(fixed(buf)?).into())
        }
        FieldType::SHORT => Value::Integer(i16::from_le_bytes(fixed(buf)?).into()),

        FieldType::YEAR => Value::Text(u16::from_le_bytes(fixed(buf)?).to_string()),

        FieldType::INT24 | FieldType::LONG if unsigned => {
            Value::UnsignedInteger(u32::from_le_bytes(fixed(buf)?))
        }
        FieldType::INT24 | FieldType::LONG => Value::Integer(i32::from_le_bytes(fixed(buf)?)),

        FieldType::LONGLONG if unsigned => {
            Value::UnsignedLongInteger(u64::from_le_bytes(fixed(buf)?))
        }
        FieldType::LONGLONG => Value::LongInteger(i64::from_le_bytes(fixed(buf)?)),

        FieldType::FLOAT => Value::Double(f32::from_le_bytes(fixed(buf)?).into()),
        FieldType::DOUBLE => Value::Double(f64::from_le_bytes(fixed(buf)?)),

        FieldType::DECIMAL | FieldType::NEWDECIMAL => {
            let cell = buf.get_bytes_lenenc()?;
            parse(&cell)
                .map(Value::Double)
                .map_err(|err| Error::decode(column.label(), err))?
        }

        FieldType::DATE | FieldType::DATETIME | FieldType::TIMESTAMP => {
            Value::Text(decode_datetime(column.ty, buf)?)
        }

        FieldType::TIME => Value::Text(decode_time(buf)?),

        FieldType::BIT | FieldType::GEOMETRY => Value::Blob(buf.get_bytes_lenenc()?.to_vec()),

        _ if column.is_binary() => Value::Blob(buf.get_bytes_lenenc()?.to_vec()),

        _ => {
            let cell = buf.get_bytes_lenenc()?;
            let text = from_utf8(&cell).map_err(|err| Error::decode(column.label(), err))?;

            Value::Text(text.to_owned())
        }
    })
}

// https://mariadb.com/kb/en/resultset-row/#date-binary-encoding
fn decode_datetime(ty: FieldType, buf: &mut Bytes) -> Result<String> {
    let [len] = fixed::<1>(buf)?;
    let mut data = BufExt::get_bytes(buf, usize::from(len))?;

    let (mut year, mut month, mut day) = (0, 0, 0);
    let (mut hour, mut minute, mut second, mut micros) = (0, 0, 0, 0);

    if len >= 4 {
        year = data.get_u16_le();
        month = data.get_u8();
        day = data.get_u8();
    }

    if len >= 7 {
        hour = data.get_u8();
        minute = data.get_u8();
        second = data.get_u8();
    }

    if len >= 11 {
        micros = data.get_u32_le();
    }

    let mut out = format!("{year:04}-{month:02}-{day:02}");

    if ty != FieldType::DATE {
        let _ = write!(out, " {hour:02}:{minute:02}:{second:02}");

        if micros != 0 {
            let _ = write!(out, ".{micros:06}");
        }
    }

    Ok(out)
}

// https://mariadb.com/kb/en/resultset-row/#time-binary-encoding
fn decode_time(buf: &mut Bytes) -> Result<String> {
    let [len] = fixed::<1>(buf)?;
    let mut data = BufExt::get_bytes(buf, usize::from(len))?;

    let (mut negative, mut hours, mut minute, mut second, mut micros) = (false, 0_u64, 0, 0, 0);

    if len >= 8 {
        negative = data.get_u8() == 1;
        let days = u64::from(data.get_u32_le());
        hours = days * 24 + u64::from(data.get_u8());
        minute = data.get_u8();
        second = data.get_u8();
    }

    if len >= 12 {
        micros = data.get_u32_le();
    }

    let mut out = String::new();

    if negative {
        out.push('-');
    }

    let _ = write!(out, "{hours:02}:{minute:02}:{second:02}");

    if micros != 0 {
        let _ = write!(out, ".{micros:06}");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tessera_core::Value;

    use super::{decode_binary_row, decode_text_row};
    use crate::protocol::column_def::ColumnDefinition;
    use crate::protocol::column_flags::ColumnFlags;
    use crate::protocol::field_type::FieldType;

    fn column(name: &str, ty: FieldType, flags: ColumnFlags, charset: u16) -> ColumnDefinition {
        ColumnDefinition {
            alias: name.to_owned(),
            name: name.to_owned(),
            charset,
            ty,
            flags,
        }
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            column("id", FieldType::LONG, ColumnFlags::UNSIGNED, 63),
            column("name", FieldType::VAR_STRING, ColumnFlags::empty(), 45),
            column("avatar", FieldType::BLOB, ColumnFlags::BLOB, 63),
            column("balance", FieldType::NEWDECIMAL, ColumnFlags::empty(), 63),
            column("big", FieldType::LONGLONG, ColumnFlags::empty(), 63),
        ]
    }

    #[test]
    fn it_decodes_text_rows() -> anyhow::Result<()> {
        let buf = Bytes::from_static(b"\x017\x05Alice\xfb\x0512.50\x0b-5000000000");

        let row = decode_text_row(buf, &columns())?;

        assert_eq!(row["id"], Value::UnsignedInteger(7));
        assert_eq!(row["name"], Value::Text("Alice".into()));
        assert_eq!(row["avatar"], Value::Null);
        assert_eq!(row["balance"], Value::Double(12.5));
        assert_eq!(row["big"], Value::LongInteger(-5_000_000_000));

        Ok(())
    }

    #[test]
    fn it_reports_undecodable_text_cells() {
        let buf = Bytes::from_static(b"\x03abc\x00\x00\x011\x011");

        let err = decode_text_row(buf, &columns()).unwrap_err();

        assert!(err.to_string().starts_with("error occurred while decoding column id"));
    }

    #[test]
    fn it_decodes_binary_rows() -> anyhow::Result<()> {
        // `name` is NULL: bit 1 + 2
        let buf = Bytes::from_static(
            b"\x00\x08\
              \x07\x00\x00\x00\
              \x02\x00\xff\
              \x041.25\
              \x00\x00\x00\x00\x00\x00\x00\x80",
        );

        let row = decode_binary_row(buf, &columns())?;

        assert_eq!(row["id"], Value::UnsignedInteger(7));
        assert_eq!(row["name"], Value::Null);
        assert_eq!(row["avatar"], Value::Blob(vec![0x00, 0xff]));
        assert_eq!(row["balance"], Value::Double(1.25));
        assert_eq!(row["big"], Value::LongInteger(i64::MIN));

        Ok(())
    }

    #[test]
    fn it_decodes_binary_temporals() -> anyhow::Result<()> {
        let columns = vec![
            column("d", FieldType::DATE, ColumnFlags::empty(), 63),
            column("dt", FieldType::DATETIME, ColumnFlags::empty(), 63),
            column("t", FieldType::TIME, ColumnFlags::empty(), 63),
        ];

        let buf = Bytes::from_static(
            b"\x00\x00\
              \x04\xe8\x07\x02\x1d\
              \x0b\xe8\x07\x02\x1d\x0d\x05\x09\x40\xe2\x01\x00\
              \x08\x01\x01\x00\x00\x00\x02\x03\x04",
        );

        let row = decode_binary_row(buf, &columns)?;

        assert_eq!(row["d"], Value::Text("2024-02-29".into()));
        assert_eq!(row["dt"], Value::Text("2024-02-29 13:05:09.123456".into()));
        assert_eq!(row["t"], Value::Text("-26:03:04".into()));

        Ok(())
    }

    #[test]
    fn it_rejects_truncated_binary_rows() {
        let buf = Bytes::from_static(b"\x00\x00\x00\x07\x00");

        assert!(decode_binary_row(buf, &columns()).is_err());
    }
}
