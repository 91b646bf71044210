use std::cell::RefCell;
use std::net::TcpStream;
use std::rc::Rc;

use tessera_core::{Backend, Rows, Socket};

use crate::error::{Error, Result};
use crate::options::is_utf8_charset;
use crate::statement::MariaDbStatement;
use crate::MariaDbConnectOptions;

mod establish;
mod executor;
mod stream;

pub(crate) use stream::MariaDbStream;

/// The MariaDB (and MySQL) backend, speaking the client/server protocol
/// over a blocking TCP stream.
///
/// ```rust,no_run
/// # use tessera_core::Database;
/// # use tessera_mariadb::MariaDb;
/// let mut db = Database::new(MariaDb::new("localhost", "shop", "secret", "shop", 3306));
///
/// if db.connect() {
///     let rows = db.query("SELECT VERSION() AS version;")?;
///     println!("{}", rows[0]["version"]);
/// }
/// # Ok::<(), tessera_core::Error>(())
/// ```
#[derive(Debug)]
pub struct MariaDb<S: Socket = TcpStream> {
    options: MariaDbConnectOptions,
    stream: Option<Rc<RefCell<MariaDbStream<S>>>>,
}

impl MariaDb {
    pub fn new(host: &str, user: &str, password: &str, database: &str, port: u16) -> Self {
        Self::with_options(
            MariaDbConnectOptions::new()
                .host(host)
                .port(port)
                .username(user)
                .password(password)
                .database(database),
        )
    }

    pub fn with_options(options: MariaDbConnectOptions) -> Self {
        Self::from_options(options)
    }
}

impl<S: Socket> MariaDb<S> {
    /// A backend over any [`Socket`]; [`MariaDb::with_options`] picks TCP.
    pub fn from_options(options: MariaDbConnectOptions) -> Self {
        Self {
            options,
            stream: None,
        }
    }

    pub fn options(&self) -> &MariaDbConnectOptions {
        &self.options
    }

    /// The thread id the server assigned to this connection.
    pub fn connection_id(&self) -> Option<u32> {
        Some(self.stream.as_ref()?.borrow().connection_id)
    }

    fn stream(&self) -> Result<&Rc<RefCell<MariaDbStream<S>>>> {
        self.stream.as_ref().ok_or(Error::NotConnected)
    }
}

impl<S: Socket> Backend for MariaDb<S> {
    type Statement = MariaDbStatement<S>;

    const NAME: &'static str = "MariaDB";

    fn pre_connect(&mut self) -> Result<()> {
        if is_utf8_charset(&self.options.charset) {
            return Ok(());
        }

        Err(Error::Connection(
            format!(
                "unsupported charset `{}`, text is always decoded as UTF-8",
                self.options.charset
            )
            .into(),
        ))
    }

    fn connect(&mut self) -> Result<()> {
        let stream = MariaDbStream::establish(&self.options).map_err(Error::into_connection_error)?;

        log::debug!(
            "connected to MariaDB at {}:{} as {}",
            self.options.host,
            self.options.port,
            self.options.username
        );

        self.stream = Some(Rc::new(RefCell::new(stream)));

        Ok(())
    }

    fn post_connect(&mut self) -> Result<()> {
        if !self.options.charset.eq_ignore_ascii_case("utf8mb4") {
            let sql = format!("SET NAMES {};", self.options.charset);
            self.silent_query(&sql)?;
        }

        Ok(())
    }

    fn disconnect(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };

        let mut stream = stream.borrow_mut();

        if let Err(err) = stream.quit() {
            log::debug!("failed to send COM_QUIT to MariaDB: {err}");
        }

        // the server may already have closed its side
        let _ = stream.shutdown();
    }

    fn prepare(&mut self, name: &str, sql: &str) -> Result<MariaDbStatement<S>> {
        MariaDbStatement::prepare(self.stream()?, name, sql)
    }

    fn query(&mut self, sql: &str) -> Result<Rows> {
        if sql.trim().is_empty() {
            return Ok(Rows::new());
        }

        self.stream()?.borrow_mut().query(sql)
    }

    fn silent_query(&mut self, sql: &str) -> Result<()> {
        self.query(sql).map(drop)
    }

    fn begin_transaction_sql() -> &'static str {
        "START TRANSACTION;"
    }

    fn begin_exclusive_transaction_sql() -> &'static str {
        "START TRANSACTION;"
    }
}
