//! Reads and writes messages to and from the PostgreSQL server.
//!
//! Every message after the startup packet starts with a one-byte format code
//! and a big-endian `i32` length that counts itself but not the format code.
//!
//! <https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-MESSAGE-CONCEPTS>

use std::io;

use bytes::Bytes;
use log::Level;
use tessera_core::Socket;

use crate::error::Result;
use crate::io::{ProtocolDecode, ProtocolEncode};
use crate::message::{
    BackendMessage, BackendMessageFormat, FrontendMessage, Notice, PgSeverity, ReadyForQuery,
    ReceivedMessage, TransactionStatus,
};
use crate::PgDatabaseError;

#[derive(Debug)]
pub(crate) struct PgStream<S> {
    socket: S,
    wbuf: Vec<u8>,

    // sent with `BackendKeyData` during startup
    pub(crate) process_id: Option<u32>,

    // as of the last `ReadyForQuery`
    pub(crate) transaction_status: TransactionStatus,
}

impl<S: Socket> PgStream<S> {
    pub(crate) fn new(socket: S) -> Self {
        Self {
            socket,
            wbuf: Vec::with_capacity(1024),
            process_id: None,
            transaction_status: TransactionStatus::Idle,
        }
    }

    /// Buffers `message`; nothing is sent until [`flush`](Self::flush).
    pub(crate) fn write_msg<M: FrontendMessage>(&mut self, message: M) -> Result<()> {
        message.encode_msg(&mut self.wbuf)
    }

    /// Buffers a message without a format code, i.e. the startup packet.
    pub(crate) fn write<'en, T: ProtocolEncode<'en>>(&mut self, value: T) -> Result<()> {
        value.encode(&mut self.wbuf)
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        if self.wbuf.is_empty() {
            return Ok(());
        }

        let result = self
            .socket
            .write_all(&self.wbuf)
            .and_then(|()| self.socket.flush());

        self.wbuf.clear();

        Ok(result?)
    }

    pub(crate) fn send<M: FrontendMessage>(&mut self, message: M) -> Result<()> {
        self.write_msg(message)?;
        self.flush()
    }

    fn recv_unchecked(&mut self) -> Result<ReceivedMessage> {
        let mut header = [0_u8; 5];
        self.socket.read_exact(&mut header)?;

        let format = BackendMessageFormat::try_from_u8(header[0])?;
        let size = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

        let size = usize::try_from(size)
            .ok()
            .and_then(|size| size.checked_sub(4))
            .ok_or_else(|| err_protocol!("message length out of range for protocol: {size}"))?;

        let mut contents = vec![0; size];
        self.socket.read_exact(&mut contents)?;

        Ok(ReceivedMessage {
            format,
            contents: Bytes::from(contents),
        })
    }

    /// Reads the next message, skipping asynchronous ones.
    ///
    /// An `ErrorResponse` is returned as [`PgDatabaseError`]; notices are
    /// logged.
    pub(crate) fn recv(&mut self) -> Result<ReceivedMessage> {
        loop {
            let message = self.recv_unchecked()?;

            match message.format {
                BackendMessageFormat::ErrorResponse => {
                    return Err(PgDatabaseError(Notice::decode(message.contents)?).into());
                }

                BackendMessageFormat::NoticeResponse => {
                    log_notice(&message.decode()?);
                }

                // runtime parameters and LISTEN/NOTIFY payloads are of no use here
                BackendMessageFormat::ParameterStatus
                | BackendMessageFormat::NotificationResponse => {}

                _ => return Ok(message),
            }
        }
    }

    pub(crate) fn recv_expect<B: BackendMessage>(&mut self) -> Result<B> {
        self.recv()?.decode()
    }

    /// Skips messages up to and including the next `ReadyForQuery`.
    ///
    /// Errors raised on the way are returned once the stream is in sync again.
    pub(crate) fn wait_until_ready(&mut self) -> Result<()> {
        let mut first_err = None;

        loop {
            match self.recv() {
                Ok(message) if message.format == BackendMessageFormat::ReadyForQuery => {
                    let ready: ReadyForQuery = message.decode()?;
                    self.transaction_status = ready.transaction_status;
                    break;
                }

                Ok(_) => {}

                Err(err @ tessera_core::Error::Database(_)) => {
                    first_err.get_or_insert(err);
                }

                Err(err) => return Err(err),
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn shutdown(&mut self) -> io::Result<()> {
        self.socket.shutdown()
    }
}

fn log_notice(notice: &Notice) {
    let level = match notice.severity() {
        PgSeverity::Fatal | PgSeverity::Panic | PgSeverity::Error => Level::Error,
        PgSeverity::Warning => Level::Warn,
        PgSeverity::Notice => Level::Info,
        PgSeverity::Debug => Level::Debug,
        PgSeverity::Info | PgSeverity::Log => Level::Trace,
    };

    log::log!(target: "tessera::postgres::notice", level, "{}", notice.message());
}
