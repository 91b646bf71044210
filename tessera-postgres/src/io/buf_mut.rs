use crate::error::Error;
use crate::io::StatementId;

pub trait PgBufMutExt {
    fn put_length_prefixed<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), Error>;

    fn put_statement_name(&mut self, id: StatementId);
}

impl PgBufMutExt for Vec<u8> {
    // writes a length-prefixed message, this is used when encoding nearly all messages as postgres
    // wants us to send the length of the often-variable-sized messages up front
    fn put_length_prefixed<F>(&mut self, write_contents: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), Error>,
    {
        // reserve space to write the prefixed length
        let offset = self.len();
        self.extend(&[0; 4]);

        // write the main body of the message
        let write_result = write_contents(self);

        let size_result = write_result.and_then(|()| {
            let size = self.len() - offset;
            i32::try_from(size)
                .map_err(|_| err_protocol!("message size out of range for protocol: {size}"))
        });

        match size_result {
            Ok(size) => {
                self[offset..(offset + 4)].copy_from_slice(&size.to_be_bytes());
                Ok(())
            }

            Err(e) => {
                // put the buffer back to where it was
                self.truncate(offset);
                Err(e)
            }
        }
    }

    #[inline]
    fn put_statement_name(&mut self, id: StatementId) {
        let _ = id.write_name(|s| {
            self.extend_from_slice(s.as_bytes());
            Ok::<_, ()>(())
        });
    }
}
