use std::path::Path;
use std::rc::Rc;

use tessera_core::{Backend, Rows};

use crate::error::{Error, Result};
use crate::statement::{SqliteStatement, StatementHandle};
use crate::SqliteConnectOptions;

mod handle;

pub(crate) use handle::ConnectionHandle;

/// The SQLite backend.
///
/// ```rust,no_run
/// # use tessera_core::Database;
/// # use tessera_sqlite::Sqlite;
/// let mut db = Database::new(Sqlite::memory());
/// assert!(db.connect());
///
/// let rows = db.query("SELECT 1 AS one;")?;
/// assert_eq!(rows[0].get::<i32, _>("one")?, 1);
/// # Ok::<(), tessera_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Sqlite {
    options: SqliteConnectOptions,
    handle: Option<Rc<ConnectionHandle>>,
}

impl Sqlite {
    /// A backend for the database file at `path`, created if missing.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(SqliteConnectOptions::new().filename(path))
    }

    /// A backend for a private in-memory database.
    pub fn memory() -> Self {
        Self::with_options(SqliteConnectOptions::new())
    }

    pub fn with_options(options: SqliteConnectOptions) -> Self {
        Self {
            options,
            handle: None,
        }
    }

    pub fn options(&self) -> &SqliteConnectOptions {
        &self.options
    }

    /// Turns on foreign key enforcement for this connection.
    pub fn enable_foreign_keys(&mut self) -> Result<()> {
        self.silent_query("PRAGMA foreign_keys = ON;")
    }

    fn connection(&self) -> Result<&Rc<ConnectionHandle>> {
        self.handle.as_ref().ok_or(Error::NotConnected)
    }
}

impl Default for Sqlite {
    fn default() -> Self {
        Self::memory()
    }
}

impl Backend for Sqlite {
    type Statement = SqliteStatement;

    const NAME: &'static str = "SQLite";

    fn connect(&mut self) -> Result<()> {
        let (filename, flags) = self.options.open_params()?;

        let handle = ConnectionHandle::open(&filename, flags).map_err(Error::into_connection_error)?;

        log::debug!(
            "opened SQLite database {}",
            self.options.get_filename().display()
        );

        self.handle = Some(Rc::new(handle));

        Ok(())
    }

    fn post_connect(&mut self) -> Result<()> {
        // the compile-time default differs between builds of SQLite
        if self.options.foreign_keys {
            self.enable_foreign_keys()
        } else {
            self.silent_query("PRAGMA foreign_keys = OFF;")
        }
    }

    fn disconnect(&mut self) {
        self.handle = None;
    }

    fn prepare(&mut self, name: &str, sql: &str) -> Result<SqliteStatement> {
        SqliteStatement::prepare(self.connection()?, name, sql)
    }

    fn query(&mut self, sql: &str) -> Result<Rows> {
        let connection = self.connection()?;

        // a query holding only whitespace or comments yields no rows
        let Some(mut handle) = StatementHandle::prepare(connection, sql, false)? else {
            return Ok(Rows::new());
        };

        let mut rows = Rows::new();

        while handle.step()? {
            rows.add(handle.read_row()?);
        }

        Ok(rows)
    }

    fn silent_query(&mut self, sql: &str) -> Result<()> {
        self.connection()?.exec(sql)
    }
}
