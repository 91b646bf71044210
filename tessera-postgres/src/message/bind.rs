use std::num::Saturating;

use tessera_core::Value;

use crate::error::Error;
use crate::io::{PgBufMutExt, StatementId};
use crate::message::{FrontendMessage, FrontendMessageFormat};

const FORMAT_TEXT: i16 = 0;
const FORMAT_BINARY: i16 = 1;

/// Binds `arguments` to a prepared statement, creating the unnamed portal.
///
/// Parameters are sent in text format, except blobs which are sent as raw
/// bytes in binary format. Parameters past the end of `arguments` are sent as
/// `NULL`. Every result column is requested in text format.
#[derive(Debug)]
pub(crate) struct Bind<'a> {
    pub(crate) statement: StatementId,

    /// The number of parameters the statement was described with.
    pub(crate) params: usize,

    pub(crate) arguments: &'a [Value],
}

impl Bind<'_> {
    fn num_params(&self) -> usize {
        self.params.max(self.arguments.len())
    }
}

impl FrontendMessage for Bind<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Bind;

    fn body_size_hint(&self) -> Saturating<usize> {
        let mut size = Saturating(0);

        // unnamed portal
        size += 1;
        size += self.statement.name_len();

        // format codes, values and their lengths
        size += 2 + 2;
        size += self.num_params().saturating_mul(2 + 4);

        for value in self.arguments {
            size += match value {
                Value::Text(text) => text.len(),
                Value::Blob(blob) => blob.len(),
                _ => 20,
            };
        }

        // result format codes
        size += 2;

        size
    }

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        let num_params = i16::try_from(self.num_params()).map_err(|_| {
            err_protocol!(
                "too many arguments for the extended query protocol: {}",
                self.num_params()
            )
        })?;

        // the destination portal; the unnamed portal is always used
        buf.push(0);

        buf.put_statement_name(self.statement);

        // the parameter format codes, one per parameter
        buf.extend(num_params.to_be_bytes());

        for index in 0..self.num_params() {
            let format = match self.arguments.get(index) {
                Some(Value::Blob(_)) => FORMAT_BINARY,
                _ => FORMAT_TEXT,
            };

            buf.extend(format.to_be_bytes());
        }

        buf.extend(num_params.to_be_bytes());

        for index in 0..self.num_params() {
            match self.arguments.get(index) {
                // NULL is encoded as a -1 for the length
                None | Some(Value::Null) => buf.extend((-1_i32).to_be_bytes()),

                Some(value) => {
                    // reserve space to write the prefixed length of the value
                    let offset = buf.len();
                    buf.extend(&[0; 4]);

                    encode_value(buf, value);

                    let len = buf.len() - offset - 4;
                    let len = i32::try_from(len)
                        .map_err(|_| err_protocol!("argument {index} is too large: {len} bytes"))?;

                    buf[offset..(offset + 4)].copy_from_slice(&len.to_be_bytes());
                }
            }
        }

        // no result format codes: every column comes back as text
        buf.extend(0_i16.to_be_bytes());

        Ok(())
    }
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    let mut itoa = itoa::Buffer::new();

    match value {
        Value::Null => {}

        Value::Integer(v) => buf.extend(itoa.format(*v).as_bytes()),
        Value::UnsignedInteger(v) => buf.extend(itoa.format(*v).as_bytes()),
        Value::LongInteger(v) => buf.extend(itoa.format(*v).as_bytes()),
        Value::UnsignedLongInteger(v) => buf.extend(itoa.format(*v).as_bytes()),

        Value::Double(v) if v.is_infinite() => {
            let text: &[u8] = if v.is_sign_positive() {
                b"Infinity"
            } else {
                b"-Infinity"
            };

            buf.extend(text);
        }

        Value::Double(v) => buf.extend(v.to_string().as_bytes()),

        Value::Text(text) => buf.extend(text.as_bytes()),
        Value::Blob(blob) => buf.extend(blob),

        Value::Boolean(v) => buf.push(if *v { b't' } else { b'f' }),
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::{values, Value};

    use super::Bind;
    use crate::io::StatementId;
    use crate::message::FrontendMessage;

    #[test]
    fn test_encode_bind_text_arguments() {
        let mut buf = Vec::new();
        let m = Bind {
            statement: StatementId::NAMED_START,
            params: 3,
            arguments: &values![42, "Alice", true],
        };

        m.encode_msg(&mut buf).unwrap();

        assert_eq!(
            buf,
            &b"B\0\0\0\x31\0tessera_s_1\0\
               \0\x03\0\0\0\0\0\0\
               \0\x03\
               \0\0\0\x0242\
               \0\0\0\x05Alice\
               \0\0\0\x01t\
               \0\0"[..]
        );
    }

    #[test]
    fn test_encode_bind_blob_and_null() {
        let mut buf = Vec::new();
        let m = Bind {
            statement: StatementId::UNNAMED,
            params: 3,
            arguments: &[Value::Blob(vec![0x00, 0x01, 0x02, 0xff]), Value::Null],
        };

        m.encode_msg(&mut buf).unwrap();

        assert_eq!(
            buf,
            &b"B\0\0\0\x22\0\0\
               \0\x03\0\x01\0\0\0\0\
               \0\x03\
               \0\0\0\x04\x00\x01\x02\xff\
               \xff\xff\xff\xff\
               \xff\xff\xff\xff\
               \0\0"[..]
        );
    }

    #[test]
    fn test_encode_bind_doubles() {
        let mut buf = Vec::new();
        let m = Bind {
            statement: StatementId::UNNAMED,
            params: 2,
            arguments: &[Value::Double(1.5), Value::Double(f64::NEG_INFINITY)],
        };

        m.encode_msg(&mut buf).unwrap();

        assert!(buf.ends_with(b"\0\0\0\x031.5\0\0\0\x09-Infinity\0\0"));
    }
}
