use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::message::{BackendMessage, BackendMessageFormat};

/// A row of a result set, as one optional raw value per column.
#[derive(Debug)]
pub(crate) struct DataRow {
    pub(crate) values: Vec<Option<Bytes>>,
}

impl BackendMessage for DataRow {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::DataRow;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 2 {
            return Err(err_protocol!("expected at least 2 bytes, got {}", buf.len()));
        }

        let cnt = usize::from(buf.get_u16());
        let mut values = Vec::with_capacity(cnt);

        for index in 0..cnt {
            if buf.len() < 4 {
                return Err(err_protocol!("missing length of column {index}"));
            }

            // length of the column value, in bytes (this count does not include itself)
            // can be zero. as a special case, -1 indicates a NULL column value
            // no value bytes follow in the NULL case
            let length = buf.get_i32();

            match usize::try_from(length) {
                Err(_) => values.push(None),

                Ok(length) if length > buf.len() => {
                    return Err(err_protocol!(
                        "column {index} claims {length} bytes but only {} remain",
                        buf.len()
                    ));
                }

                Ok(length) => values.push(Some(buf.split_to(length))),
            }
        }

        Ok(Self { values })
    }
}

#[test]
fn test_decode_data_row() {
    const DATA: &[u8] = b"\x00\x08\xff\xff\xff\xff\x00\x00\x00\x04\x00\x00\x00\n\xff\xff\xff\xff\x00\x00\x00\x04\x00\x00\x00\x14\xff\xff\xff\xff\x00\x00\x00\x04\x00\x00\x00(\xff\xff\xff\xff\x00\x00\x00\x04\x00\x00\x00P";

    let row = DataRow::decode_body(DATA.into()).unwrap();

    assert_eq!(row.values.len(), 8);

    assert!(row.values[0].is_none());
    assert_eq!(row.values[1].as_deref(), Some(&[0_u8, 0, 0, 10][..]));
    assert!(row.values[2].is_none());
    assert_eq!(row.values[3].as_deref(), Some(&[0_u8, 0, 0, 20][..]));
    assert!(row.values[4].is_none());
    assert_eq!(row.values[5].as_deref(), Some(&[0_u8, 0, 0, 40][..]));
    assert!(row.values[6].is_none());
    assert_eq!(row.values[7].as_deref(), Some(&[0_u8, 0, 0, 80][..]));
}

#[test]
fn test_decode_data_row_overrun() {
    const DATA: &[u8] = b"\x00\x01\x00\x00\x00\x09abc";

    assert!(DataRow::decode_body(DATA.into()).is_err());
}
