use bytes::Bytes;
use tessera_core::{Row, Rows, Socket, Value};

use super::stream::MariaDbStream;
use crate::error::Result;
use crate::io::MariaDbBufExt;
use crate::protocol::column_def::ColumnDefinition;
use crate::protocol::response::Status;
use crate::protocol::row::{decode_binary_row, decode_text_row};
use crate::protocol::statement::{Execute, Prepare, PrepareOk, StmtClose};
use crate::protocol::text::{Query, Quit};
use crate::protocol::Capabilities;

type RowDecoder = fn(Bytes, &[ColumnDefinition]) -> Result<Row>;

impl<S: Socket> MariaDbStream<S> {
    /// Runs `sql` over the text protocol and collects every row of every
    /// result set it produces.
    pub(crate) fn query(&mut self, sql: &str) -> Result<Rows> {
        self.send_packet(Query(sql))?;

        self.recv_result_sets(decode_text_row)
    }

    /// Prepares `sql` and returns the statement id and parameter count.
    pub(crate) fn prepare(&mut self, sql: &str) -> Result<PrepareOk> {
        self.send_packet(Prepare { query: sql })?;

        let ok: PrepareOk = self.recv()?;

        if ok.warnings > 0 {
            log::debug!("preparing statement raised {} warning(s)", ok.warnings);
        }

        // parameter and column definitions are only needed once rows arrive;
        // the binary result set repeats the column definitions
        if ok.params > 0 {
            self.skip_definitions(ok.params)?;
        }

        if ok.columns > 0 {
            self.skip_definitions(ok.columns)?;
        }

        Ok(ok)
    }

    pub(crate) fn execute(&mut self, statement: u32, params: u16, arguments: &[Value]) -> Result<Rows> {
        self.send_packet(Execute {
            statement,
            params,
            arguments,
        })?;

        self.recv_result_sets(decode_binary_row)
    }

    /// The server does not reply to `COM_STMT_CLOSE`.
    pub(crate) fn close_statement(&mut self, statement: u32) -> Result<()> {
        self.send_packet(StmtClose { statement })
    }

    /// The server closes the connection without replying to `COM_QUIT`.
    pub(crate) fn quit(&mut self) -> Result<()> {
        self.send_packet(Quit)
    }

    fn skip_definitions(&mut self, count: u16) -> Result<()> {
        for _ in 0..count {
            self.recv_packet()?;
        }

        if !self.capabilities.contains(Capabilities::DEPRECATE_EOF) {
            self.recv_packet()?.eof(self.capabilities)?;
        }

        Ok(())
    }

    /// Reads every result set up to the final EOF or OK packet.
    ///
    /// A row that fails to decode does not stop the read; the remaining rows
    /// are drained so the stream stays in sync, then the first error is
    /// returned.
    fn recv_result_sets(&mut self, decode_row: RowDecoder) -> Result<Rows> {
        let mut rows = Rows::new();
        let mut failure = None;

        loop {
            let mut packet = self.recv_packet()?;

            let status = match packet.first().copied() {
                // a statement without a result set, e.g. INSERT
                Some(0x00) => {
                    let ok = packet.ok()?;

                    log::debug!(
                        "statement affected {} row(s), last insert id {}",
                        ok.affected_rows,
                        ok.last_insert_id
                    );

                    ok.status
                }

                Some(0xfb) => {
                    return Err(err_protocol!("LOAD DATA LOCAL INFILE is not supported"));
                }

                Some(_) => {
                    let column_count = packet.get_uint_lenenc()?;
                    let columns = self.recv_columns(column_count)?;

                    loop {
                        let packet = self.recv_packet()?;

                        if packet.is_end_of_rows() {
                            let eof = packet.eof(self.capabilities)?;

                            if eof.warnings > 0 {
                                log::debug!("result set raised {} warning(s)", eof.warnings);
                            }

                            break eof.status;
                        }

                        if failure.is_some() {
                            continue;
                        }

                        match decode_row(packet.0, &columns) {
                            Ok(row) => rows.add(row),
                            Err(err) => failure = Some(err),
                        }
                    }
                }

                None => return Err(err_protocol!("received an empty packet")),
            };

            if !status.contains(Status::MORE_RESULTS_EXISTS) {
                break;
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(rows),
        }
    }

    fn recv_columns(&mut self, count: u64) -> Result<Vec<ColumnDefinition>> {
        let mut columns = Vec::new();

        for _ in 0..count {
            columns.push(self.recv()?);
        }

        if !self.capabilities.contains(Capabilities::DEPRECATE_EOF) {
            self.recv_packet()?.eof(self.capabilities)?;
        }

        Ok(columns)
    }
}
