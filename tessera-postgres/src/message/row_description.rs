use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug)]
pub(crate) struct RowDescription {
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug)]
pub(crate) struct Field {
    /// The name of the field.
    pub(crate) name: String,

    /// The object ID of the field's data type.
    pub(crate) type_id: u32,
}

impl BackendMessage for RowDescription {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::RowDescription;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if buf.len() < 2 {
            return Err(err_protocol!("expected at least 2 bytes, got {}", buf.len()));
        }

        let cnt = buf.get_u16();
        let mut fields = Vec::with_capacity(usize::from(cnt));

        for _ in 0..cnt {
            let name = buf.get_str_nul()?;

            // relation id, attribute number, type id, type size, modifier, format
            if buf.len() < 18 {
                return Err(err_protocol!(
                    "expected 18 bytes after the name of field {name:?}, got {}",
                    buf.len()
                ));
            }

            let _relation_id = buf.get_u32();
            let _relation_attribute_no = buf.get_i16();
            let type_id = buf.get_u32();
            let _type_size = buf.get_i16();
            let _type_modifier = buf.get_i32();

            // always zero in a statement description; every column is
            // requested as text in `Bind`
            let _format = buf.get_i16();

            fields.push(Field { name, type_id });
        }

        Ok(Self { fields })
    }
}

#[test]
fn test_decode_row_description() {
    // SELECT id, name FROM users
    const DATA: &[u8] = b"\0\x02id\0\0\0@\x02\0\x01\0\0\0\x17\0\x04\xff\xff\xff\xff\0\0name\0\0\0@\x02\0\x02\0\0\0\x19\xff\xff\xff\xff\xff\xff\0\0";

    let m = RowDescription::decode_body(Bytes::from_static(DATA)).unwrap();

    assert_eq!(m.fields.len(), 2);

    assert_eq!(m.fields[0].name, "id");
    assert_eq!(m.fields[0].type_id, 23);

    assert_eq!(m.fields[1].name, "name");
    assert_eq!(m.fields[1].type_id, 25);
}

#[test]
fn test_decode_truncated_row_description() {
    const DATA: &[u8] = b"\0\x01id\0\0\0@\x02";

    assert!(RowDescription::decode_body(Bytes::from_static(DATA)).is_err());
}
