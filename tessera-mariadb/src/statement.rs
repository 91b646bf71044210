use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tessera_core::{Arguments, PreparedStatement, Rows, Socket, Value};

use crate::connection::MariaDbStream;
use crate::error::{Error, Result};
use crate::MariaDbDatabaseError;

/// A statement prepared on the server with `COM_STMT_PREPARE`.
///
/// The server-side statement is closed when this is dropped. Once the
/// connection is closed every execution fails with [`Error::NotConnected`].
#[derive(Debug)]
pub struct MariaDbStatement<S: Socket> {
    name: String,
    query: String,
    id: u32,
    params: u16,
    arguments: Arguments,
    stream: Weak<RefCell<MariaDbStream<S>>>,
}

impl<S: Socket> MariaDbStatement<S> {
    pub(crate) fn prepare(
        stream: &Rc<RefCell<MariaDbStream<S>>>,
        name: &str,
        query: &str,
    ) -> Result<Self> {
        // the server rejects a trailing terminator in prepared statements
        let sql = query.trim_end_matches(|c: char| c.is_whitespace() || c == ';');

        if sql.trim_start().is_empty() {
            return Err(MariaDbDatabaseError::new(1065, "Query was empty").into());
        }

        let ok = stream.borrow_mut().prepare(sql)?;

        Ok(Self {
            name: name.to_owned(),
            query: query.to_owned(),
            id: ok.statement_id,
            params: ok.params,
            arguments: Arguments::new(),
            stream: Rc::downgrade(stream),
        })
    }

    /// The number of `?` placeholders the server found.
    pub fn params(&self) -> u16 {
        self.params
    }
}

impl<S: Socket> PreparedStatement for MariaDbStatement<S> {
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
    }

    fn do_execute(&mut self) -> Result<Rows> {
        let stream = self.stream.upgrade().ok_or(Error::NotConnected)?;

        if self.arguments.len() > usize::from(self.params) {
            return Err(MariaDbDatabaseError::new(2034, "Invalid parameter number").into());
        }

        let mut stream = stream.borrow_mut();

        stream.execute(self.id, self.params, self.arguments.as_slice())
    }
}

impl<S: Socket> Drop for MariaDbStatement<S> {
    fn drop(&mut self) {
        let Some(stream) = self.stream.upgrade() else {
            return;
        };

        let Ok(mut stream) = stream.try_borrow_mut() else {
            return;
        };

        if let Err(err) = stream.close_statement(self.id) {
            tracing::warn!(statement = %self.name, "failed to close prepared statement: {err}");
        }
    }
}
