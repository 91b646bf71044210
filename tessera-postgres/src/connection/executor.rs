use tessera_core::{Rows, Socket, Value};

use super::stream::PgStream;
use crate::error::{Error, Result};
use crate::io::StatementId;
use crate::message::{
    Bind, BackendMessageFormat, Close, Describe, Execute, Field, ParameterDescription, Parse,
    Query, RowDescription, Sync, Terminate,
};
use crate::row::decode_row;

// https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-EXT-QUERY

impl<S: Socket> PgStream<S> {
    /// Parses `sql` into the statement `id` and describes it.
    ///
    /// Returns the number of parameters and the columns of the result.
    pub(crate) fn prepare(&mut self, id: StatementId, sql: &str) -> Result<(usize, Vec<Field>)> {
        self.write_msg(Parse {
            statement: id,
            query: sql,
        })?;
        self.write_msg(Describe(id))?;
        self.write_msg(Sync)?;
        self.flush()?;

        let result = self.recv_description();
        self.finish(result)
    }

    pub(crate) fn execute(
        &mut self,
        id: StatementId,
        params: usize,
        fields: &[Field],
        arguments: &[Value],
    ) -> Result<Rows> {
        self.write_msg(Bind {
            statement: id,
            params,
            arguments,
        })?;
        self.write_msg(Execute { limit: 0 })?;
        self.write_msg(Sync)?;
        self.flush()?;

        let result = self.recv_rows(fields);
        self.finish(result)
    }

    /// Runs `sql` through the unnamed statement and collects its rows.
    pub(crate) fn query(&mut self, sql: &str) -> Result<Rows> {
        let (params, fields) = self.prepare(StatementId::UNNAMED, sql)?;

        self.execute(StatementId::UNNAMED, params, &fields, &[])
    }

    /// Runs `sql` with the simple query protocol, discarding any rows.
    ///
    /// `sql` may hold several statements separated by `;`.
    pub(crate) fn simple_query(&mut self, sql: &str) -> Result<()> {
        self.send(Query(sql))?;
        self.wait_until_ready()
    }

    pub(crate) fn close_statement(&mut self, id: StatementId) -> Result<()> {
        self.write_msg(Close(id))?;
        self.write_msg(Sync)?;
        self.flush()?;

        let result = self.expect_format(BackendMessageFormat::CloseComplete);
        self.finish(result)
    }

    /// The server closes the connection without replying to `Terminate`.
    pub(crate) fn terminate(&mut self) -> Result<()> {
        self.send(Terminate)
    }

    fn recv_description(&mut self) -> Result<(usize, Vec<Field>)> {
        self.expect_format(BackendMessageFormat::ParseComplete)?;

        let params: ParameterDescription = self.recv_expect()?;

        let message = self.recv()?;

        let fields = match message.format {
            BackendMessageFormat::RowDescription => message.decode::<RowDescription>()?.fields,

            // a statement without a result, e.g. INSERT
            BackendMessageFormat::NoData => Vec::new(),

            format => {
                return Err(err_protocol!(
                    "expected RowDescription or NoData, got {format:?}"
                ));
            }
        };

        Ok((params.types.len(), fields))
    }

    fn recv_rows(&mut self, fields: &[Field]) -> Result<Rows> {
        self.expect_format(BackendMessageFormat::BindComplete)?;

        let mut rows = Rows::new();

        loop {
            let message = self.recv()?;

            match message.format {
                BackendMessageFormat::DataRow => {
                    rows.add(decode_row(fields, message.decode()?)?);
                }

                BackendMessageFormat::CommandComplete
                | BackendMessageFormat::EmptyQueryResponse
                | BackendMessageFormat::PortalSuspended => break,

                BackendMessageFormat::CopyInResponse | BackendMessageFormat::CopyOutResponse => {
                    return Err(err_protocol!("COPY is not supported"));
                }

                format => {
                    return Err(err_protocol!("execute: unexpected message: {format:?}"));
                }
            }
        }

        Ok(rows)
    }

    fn expect_format(&mut self, format: BackendMessageFormat) -> Result<()> {
        let message = self.recv()?;

        if message.format != format {
            return Err(err_protocol!(
                "expected {format:?}, got {:?}",
                message.format
            ));
        }

        Ok(())
    }

    /// Reads up to the `ReadyForQuery` that answers `Sync`.
    ///
    /// After a transport or protocol failure the stream cannot be resynced and
    /// the error is returned as is.
    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.wait_until_ready()?;
                Ok(value)
            }

            Err(err @ (Error::Io(_) | Error::Protocol(_))) => Err(err),

            Err(err) => {
                match self.wait_until_ready() {
                    Ok(()) | Err(Error::Database(_)) => {}
                    Err(resync) => return Err(resync),
                }

                Err(err)
            }
        }
    }
}
