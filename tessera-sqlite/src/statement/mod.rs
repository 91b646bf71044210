use std::rc::{Rc, Weak};

use tessera_core::{Arguments, PreparedStatement, Rows, Value};

use crate::connection::ConnectionHandle;
use crate::error::{Error, Result};
use crate::SqliteError;

mod handle;

pub(crate) use handle::StatementHandle;

/// A prepared statement compiled by SQLite.
///
/// Holds a weak reference to its connection; once the connection is closed
/// every execution fails with [`Error::NotConnected`].
#[derive(Debug)]
pub struct SqliteStatement {
    name: String,
    query: String,
    arguments: Arguments,
    handle: StatementHandle,
    connection: Weak<ConnectionHandle>,
}

impl SqliteStatement {
    pub(crate) fn prepare(connection: &Rc<ConnectionHandle>, name: &str, query: &str) -> Result<Self> {
        let handle = StatementHandle::prepare(connection, query, true)?.ok_or_else(|| {
            SqliteError::misuse(format!("statement {name:?} does not contain any SQL"))
        })?;

        Ok(Self {
            name: name.to_owned(),
            query: query.to_owned(),
            arguments: Arguments::new(),
            handle,
            connection: Rc::downgrade(connection),
        })
    }
}

impl PreparedStatement for SqliteStatement {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn bind(&mut self, index: usize, value: Value) {
        self.arguments.bind(index, value);
    }

    fn reset(&mut self) {
        self.arguments.clear();

        // `sqlite3_reset` repeats the error of the last step, which has
        // already been reported by `do_execute`
        let _ = self.handle.reset();
        self.handle.clear_bindings();
    }

    fn do_execute(&mut self) -> Result<Rows> {
        let _connection = self.connection.upgrade().ok_or(Error::NotConnected)?;

        for (index, value) in self.arguments.iter().enumerate() {
            self.handle.bind_value(index + 1, value)?;
        }

        let mut rows = Rows::new();

        while self.handle.step()? {
            rows.add(self.handle.read_row()?);
        }

        Ok(rows)
    }
}
