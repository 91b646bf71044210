use std::cell::RefCell;
use std::net::TcpStream;
use std::rc::Rc;

use tessera_core::{Backend, Rows, Socket};

use crate::error::{Error, Result};
use crate::io::StatementId;
use crate::message::TransactionStatus;
use crate::statement::PgStatement;
use crate::PgConnectOptions;

mod establish;
mod executor;
mod sasl;
mod stream;

pub(crate) use stream::PgStream;

/// The PostgreSQL backend, speaking the v3 frontend/backend protocol over a
/// blocking TCP stream.
///
/// ```rust,no_run
/// # use tessera_core::Database;
/// # use tessera_postgres::Postgres;
/// let mut db = Database::new(Postgres::new("localhost", "shop", "secret", "shop"));
///
/// if db.connect() {
///     let rows = db.query("SELECT version() AS version;")?;
///     println!("{}", rows[0]["version"]);
/// }
/// # Ok::<(), tessera_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Postgres<S: Socket = TcpStream> {
    options: PgConnectOptions,
    stream: Option<Rc<RefCell<PgStream<S>>>>,
    next_statement_id: StatementId,
}

impl Postgres {
    pub fn new(host: &str, user: &str, password: &str, database: &str) -> Self {
        Self::with_options(
            PgConnectOptions::new()
                .host(host)
                .port(5432)
                .username(user)
                .password(password)
                .database(database),
        )
    }

    pub fn with_options(options: PgConnectOptions) -> Self {
        Self::from_options(options)
    }
}

impl<S: Socket> Postgres<S> {
    /// A backend over any [`Socket`]; [`Postgres::with_options`] picks TCP.
    pub fn from_options(options: PgConnectOptions) -> Self {
        Self {
            options,
            stream: None,
            next_statement_id: StatementId::NAMED_START,
        }
    }

    pub fn options(&self) -> &PgConnectOptions {
        &self.options
    }

    /// The process id of the server backend handling this connection.
    pub fn process_id(&self) -> Option<u32> {
        self.stream.as_ref()?.borrow().process_id
    }

    /// Whether the server reported an open transaction block (possibly a
    /// failed one) after the last command.
    pub fn in_transaction(&self) -> bool {
        self.stream.as_ref().is_some_and(|stream| {
            stream.borrow().transaction_status != TransactionStatus::Idle
        })
    }

    fn stream(&self) -> Result<&Rc<RefCell<PgStream<S>>>> {
        self.stream.as_ref().ok_or(Error::NotConnected)
    }
}

impl<S: Socket> Backend for Postgres<S> {
    type Statement = PgStatement<S>;

    const NAME: &'static str = "PostgreSQL";

    fn connect(&mut self) -> Result<()> {
        let stream = PgStream::establish(&self.options).map_err(Error::into_connection_error)?;

        log::debug!(
            "connected to PostgreSQL at {}:{} as {}",
            self.options.host,
            self.options.port,
            self.options.username
        );

        self.stream = Some(Rc::new(RefCell::new(stream)));
        self.next_statement_id = StatementId::NAMED_START;

        Ok(())
    }

    fn disconnect(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };

        let mut stream = stream.borrow_mut();

        if let Err(err) = stream.terminate() {
            log::debug!("failed to send Terminate to PostgreSQL: {err}");
        }

        // the server may already have closed its side
        let _ = stream.shutdown();
    }

    fn prepare(&mut self, name: &str, sql: &str) -> Result<PgStatement<S>> {
        let id = self.next_statement_id;
        self.next_statement_id = id.next();

        PgStatement::prepare(self.stream()?, id, name, sql)
    }

    fn query(&mut self, sql: &str) -> Result<Rows> {
        if sql.trim().is_empty() {
            return Ok(Rows::new());
        }

        self.stream()?.borrow_mut().query(sql)
    }

    fn silent_query(&mut self, sql: &str) -> Result<()> {
        self.stream()?.borrow_mut().simple_query(sql)
    }

    fn begin_exclusive_transaction_sql() -> &'static str {
        "BEGIN TRANSACTION ISOLATION LEVEL SERIALIZABLE;"
    }
}
