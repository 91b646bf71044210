use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tessera_core::{Arguments, PreparedStatement, Rows, Socket, Value};

use crate::connection::PgStream;
use crate::error::{Error, Result};
use crate::io::StatementId;
use crate::message::Field;
use crate::PgDatabaseError;

/// A named statement prepared on the server with `Parse`.
///
/// The server-side statement is closed when this is dropped.
#[derive(Debug)]
pub struct PgStatement<S: Socket> {
    name: String,
    query: String,
    id: StatementId,
    params: usize,
    fields: Vec<Field>,
    arguments: Arguments,
    stream: Weak<RefCell<PgStream<S>>>,
}

impl<S: Socket> PgStatement<S> {
    pub(crate) fn prepare(
        stream: &Rc<RefCell<PgStream<S>>>,
        id: StatementId,
        name: &str,
        query: &str,
    ) -> Result<Self> {
        let sql = query.trim_end_matches(|c: char| c.is_whitespace() || c == ';');

        if sql.trim_start().is_empty() {
            return Err(PgDatabaseError::client("42601", "cannot prepare an empty statement"));
        }

        let (params, fields) = stream.borrow_mut().prepare(id, sql)?;

        Ok(Self {
            name: name.to_owned(),
            query: query.to_owned(),
            id,
            params,
            fields,
            arguments: Arguments::new(),
            stream: Rc::downgrade(stream),
        })
    }

    /// The number of `$n` parameters the server found.
    pub fn params(&self) -> usize {
        self.params
    }

    /// Names of the result columns, in order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

impl<S: Socket> PreparedStatement for PgStatement<S> {
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
        let mut stream = stream.borrow_mut();

        stream.execute(self.id, self.params, &self.fields, self.arguments.as_slice())
    }
}

impl<S: Socket> Drop for PgStatement<S> {
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
