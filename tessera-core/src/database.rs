use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::mem;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::logger::{LogSettings, QueryLogger};
use crate::rows::Rows;
use crate::statement::PreparedStatement;
use crate::value::Value;

type AfterConnect<B> = dyn FnMut(&mut Database<B>) -> Result<()>;

/// A single connection to a database, with a registry of named prepared
/// statements.
///
/// ```rust,ignore
/// let mut db = Database::new(Sqlite::memory());
///
/// if db.connect() {
///     db.silent_query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);");
///     db.prepare_stmt("insert_user", "INSERT INTO users (name) VALUES (?);")?;
///     db.execute_stmt("insert_user", ["Alice"])?;
/// }
/// ```
pub struct Database<B: Backend> {
    // declared before `backend` so statements are always dropped first
    statements: HashMap<String, B::Statement>,
    backend: B,
    connected: bool,
    log_settings: LogSettings,
    after_connect: Option<Box<AfterConnect<B>>>,
}

impl<B: Backend> Database<B> {
    pub fn new(backend: B) -> Self {
        Self {
            statements: HashMap::new(),
            backend,
            connected: false,
            log_settings: LogSettings::default(),
            after_connect: None,
        }
    }

    /// Connects to the database, returning whether the connection is now open.
    ///
    /// Failures are logged; use [`try_connect`](Self::try_connect) to inspect them.
    /// Calling this on a connected database does nothing and returns `false`.
    pub fn connect(&mut self) -> bool {
        match self.try_connect() {
            Ok(()) => true,

            Err(Error::AlreadyConnected) => {
                log::warn!("{} database is already connected", B::NAME);
                false
            }

            Err(err) => {
                log::error!("failed to connect to {} database: {err}", B::NAME);
                false
            }
        }
    }

    pub fn try_connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }

        self.backend.pre_connect()?;
        self.backend.connect()?;
        self.connected = true;

        log::debug!("connected to {} database", B::NAME);

        if let Err(err) = self.post_connect() {
            log::error!("post-connect hook failed on {} database: {err}", B::NAME);
        }

        Ok(())
    }

    fn post_connect(&mut self) -> Result<()> {
        self.backend.post_connect()?;

        if let Some(mut hook) = self.after_connect.take() {
            let result = hook(self);
            self.after_connect = Some(hook);
            result?;
        }

        Ok(())
    }

    /// Drops every prepared statement and closes the connection.
    ///
    /// Safe to call any number of times.
    pub fn disconnect(&mut self) {
        self.statements.clear();
        self.backend.pre_disconnect();

        self.backend.disconnect();

        self.backend.post_disconnect();

        if mem::replace(&mut self.connected, false) {
            log::debug!("disconnected from {} database", B::NAME);
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Replaces the statement logging configuration.
    pub fn log_settings(&mut self, settings: LogSettings) -> &mut Self {
        self.log_settings = settings;
        self
    }

    /// Registers a callback that runs after every successful connect, once
    /// the backend's own post-connect hook has finished.
    pub fn after_connect<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(&mut Database<B>) -> Result<()> + 'static,
    {
        self.after_connect = Some(Box::new(callback));
        self
    }

    /// Runs `sql` and returns every row it produced.
    pub fn query(&mut self, sql: &str) -> Result<Rows> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let mut logger = QueryLogger::new(sql, &self.log_settings);

        let rows = self.backend.query(sql)?;
        logger.increase_rows_returned(rows.len());

        Ok(rows)
    }

    /// Runs `sql`, discarding any rows. Failures are logged and reported as `false`.
    pub fn silent_query(&mut self, sql: &str) -> bool {
        match self.try_silent_query(sql) {
            Ok(()) => true,

            Err(err) => {
                log::error!("query failed on {} database: {err}", B::NAME);
                false
            }
        }
    }

    pub fn try_silent_query(&mut self, sql: &str) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let _logger = QueryLogger::new(sql, &self.log_settings);

        self.backend.silent_query(sql)
    }

    /// Prepares `sql` and registers it as `name`, replacing any statement
    /// already registered under that name.
    ///
    /// Nothing is registered when preparation fails.
    pub fn prepare_stmt(&mut self, name: &str, sql: &str) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let statement = self.backend.prepare(name, sql).map_err(|err| {
            log::error!("failed to prepare statement {name:?}: {err}");
            err
        })?;

        if self.statements.insert(name.to_owned(), statement).is_some() {
            log::debug!("replaced prepared statement {name:?}");
        }

        Ok(())
    }

    /// Executes the statement registered as `name` with `args` bound in order.
    pub fn execute_stmt<I>(&mut self, name: &str, args: I) -> Result<Rows>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let statement = self
            .statements
            .get_mut(name)
            .ok_or_else(|| Error::UnknownStatement(name.to_owned()))?;

        let sql = statement.query().to_owned();
        let mut logger = QueryLogger::new(&sql, &self.log_settings);

        let rows = statement.execute(args)?;
        logger.increase_rows_returned(rows.len());

        Ok(rows)
    }

    /// Returns `true` if a statement is registered under `name`.
    pub fn has_stmt(&self, name: &str) -> bool {
        self.statements.contains_key(name)
    }

    pub fn begin_transaction(&mut self) -> bool {
        self.silent_query(B::begin_transaction_sql())
    }

    pub fn begin_exclusive_transaction(&mut self) -> bool {
        self.silent_query(B::begin_exclusive_transaction_sql())
    }

    pub fn commit_transaction(&mut self) -> bool {
        self.silent_query(B::commit_transaction_sql())
    }

    pub fn rollback_transaction(&mut self) -> bool {
        self.silent_query(B::rollback_transaction_sql())
    }
}

impl<B: Backend> Drop for Database<B> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<B: Backend + Debug> Debug for Database<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend)
            .field("connected", &self.connected)
            .field("statements", &self.statements.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Database;
    use crate::{values, Arguments, Backend, Error, PreparedStatement, Result, Row, Rows, Value};

    type Journal = Rc<RefCell<Vec<String>>>;

    fn record(journal: &Journal, entry: impl Into<String>) {
        journal.borrow_mut().push(entry.into());
    }

    #[derive(Default)]
    struct MockBackend {
        journal: Journal,
        fail_connect: bool,
        fail_post_connect: bool,
        open: bool,
    }

    struct MockStatement {
        name: String,
        query: String,
        arguments: Arguments,
        journal: Journal,
    }

    impl PreparedStatement for MockStatement {
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

        // echoes the SQL and the bound arguments back as a single row
        fn do_execute(&mut self) -> Result<Rows> {
            let mut row = Row::new();
            row.add("query", Value::Text(self.query.clone()));

            for (index, value) in self.arguments.iter().enumerate() {
                row.add(format!("${}", index + 1), value.clone());
            }

            Ok([row].into_iter().collect())
        }
    }

    impl Drop for MockStatement {
        fn drop(&mut self) {
            record(&self.journal, format!("finalize {}", self.name));
        }
    }

    impl Backend for MockBackend {
        type Statement = MockStatement;

        const NAME: &'static str = "mock";

        fn pre_connect(&mut self) -> Result<()> {
            record(&self.journal, "pre_connect");
            Ok(())
        }

        fn connect(&mut self) -> Result<()> {
            record(&self.journal, "connect");

            if self.fail_connect {
                return Err(Error::connection("connection refused"));
            }

            self.open = true;
            Ok(())
        }

        fn post_connect(&mut self) -> Result<()> {
            record(&self.journal, "post_connect");

            if self.fail_post_connect {
                return Err(Error::protocol("pragma failed"));
            }

            Ok(())
        }

        fn pre_disconnect(&mut self) {
            record(&self.journal, "pre_disconnect");
        }

        fn disconnect(&mut self) {
            record(&self.journal, "disconnect");
            self.open = false;
        }

        fn post_disconnect(&mut self) {
            record(&self.journal, "post_disconnect");
        }

        fn prepare(&mut self, name: &str, sql: &str) -> Result<MockStatement> {
            if sql.contains("SYNTAX ERROR") {
                return Err(Error::protocol("near \"SYNTAX\": syntax error"));
            }

            Ok(MockStatement {
                name: name.to_owned(),
                query: sql.to_owned(),
                arguments: Arguments::new(),
                journal: self.journal.clone(),
            })
        }

        fn query(&mut self, sql: &str) -> Result<Rows> {
            self.prepare("", sql)?.execute(Vec::<Value>::new())
        }

        fn silent_query(&mut self, sql: &str) -> Result<()> {
            record(&self.journal, sql);
            Ok(())
        }

        fn begin_exclusive_transaction_sql() -> &'static str {
            "BEGIN IMMEDIATE;"
        }
    }

    fn database() -> (Database<MockBackend>, Journal) {
        let backend = MockBackend::default();
        let journal = backend.journal.clone();

        (Database::new(backend), journal)
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.borrow_mut().drain(..).collect()
    }

    #[test]
    fn it_connects_through_every_phase() {
        let (mut db, journal) = database();

        assert!(!db.is_connected());
        assert!(db.connect());
        assert!(db.is_connected());
        assert!(db.backend().open);
        assert_eq!(entries(&journal), ["pre_connect", "connect", "post_connect"]);

        // a second connect is refused without touching the backend
        assert!(!db.connect());
        assert!(matches!(db.try_connect(), Err(Error::AlreadyConnected)));
        assert!(entries(&journal).is_empty());
    }

    #[test]
    fn it_stays_disconnected_when_connect_fails() {
        let (mut db, _journal) = database();
        db.backend_mut().fail_connect = true;

        assert!(!db.connect());
        assert!(!db.is_connected());
        assert!(matches!(db.query("SELECT 1"), Err(Error::NotConnected)));
    }

    #[test]
    fn it_stays_connected_when_post_connect_fails() {
        let (mut db, _journal) = database();
        db.backend_mut().fail_post_connect = true;

        assert!(db.connect());
        assert!(db.is_connected());
    }

    #[test]
    fn it_runs_the_after_connect_callback() -> anyhow::Result<()> {
        let (mut db, journal) = database();

        db.after_connect(|db| {
            db.prepare_stmt("ping", "SELECT 1")?;
            Ok(())
        });

        assert!(db.connect());
        assert!(db.has_stmt("ping"));
        assert_eq!(entries(&journal), ["pre_connect", "connect", "post_connect"]);

        // the callback runs again after a reconnect
        db.disconnect();
        assert!(!db.has_stmt("ping"));
        assert!(db.connect());
        assert!(db.has_stmt("ping"));

        Ok(())
    }

    #[test]
    fn it_finalizes_statements_before_disconnecting() -> anyhow::Result<()> {
        let (mut db, journal) = database();
        assert!(db.connect());

        db.prepare_stmt("select_users", "SELECT * FROM users")?;
        entries(&journal);

        db.disconnect();

        assert_eq!(
            entries(&journal),
            [
                "finalize select_users",
                "pre_disconnect",
                "disconnect",
                "post_disconnect"
            ]
        );

        assert!(!db.is_connected());
        assert!(!db.backend().open);

        // disconnect is idempotent and still runs every phase
        db.disconnect();
        assert_eq!(
            entries(&journal),
            ["pre_disconnect", "disconnect", "post_disconnect"]
        );

        Ok(())
    }

    #[test]
    fn it_disconnects_on_drop() -> anyhow::Result<()> {
        let (mut db, journal) = database();
        assert!(db.connect());
        db.prepare_stmt("select_users", "SELECT * FROM users")?;
        entries(&journal);

        drop(db);

        assert_eq!(
            entries(&journal),
            [
                "finalize select_users",
                "pre_disconnect",
                "disconnect",
                "post_disconnect"
            ]
        );

        Ok(())
    }

    #[test]
    fn it_fails_without_a_connection() {
        let (mut db, _journal) = database();

        assert!(matches!(db.query("SELECT 1"), Err(Error::NotConnected)));
        assert!(matches!(
            db.prepare_stmt("a", "SELECT 1"),
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            db.execute_stmt("a", values![]),
            Err(Error::NotConnected)
        ));
        assert!(!db.silent_query("DELETE FROM users"));
        assert!(!db.begin_transaction());
    }

    #[test]
    fn it_executes_registered_statements() -> anyhow::Result<()> {
        let (mut db, _journal) = database();
        assert!(db.connect());

        db.prepare_stmt("insert_user", "INSERT INTO users VALUES (?, ?)")?;

        let rows = db.execute_stmt("insert_user", values![1, "Alice"])?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["$1"], Value::Integer(1));
        assert_eq!(rows[0]["$2"], Value::Text("Alice".into()));

        // no binding survives into the next execution
        let rows = db.execute_stmt("insert_user", [Value::Null])?;
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0].try_get("$2").is_err());

        Ok(())
    }

    #[test]
    fn it_rejects_unknown_statements() {
        let (mut db, _journal) = database();
        assert!(db.connect());

        assert!(matches!(
            db.execute_stmt("nonexistent", values![]),
            Err(Error::UnknownStatement(name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn it_replaces_statements_with_the_same_name() -> anyhow::Result<()> {
        let (mut db, journal) = database();
        assert!(db.connect());

        db.prepare_stmt("stmt", "SELECT 1")?;
        db.prepare_stmt("stmt", "SELECT 2")?;

        assert_eq!(
            entries(&journal),
            ["pre_connect", "connect", "post_connect", "finalize stmt"]
        );

        let rows = db.execute_stmt("stmt", values![])?;
        assert_eq!(rows[0]["query"], Value::Text("SELECT 2".into()));

        Ok(())
    }

    #[test]
    fn it_registers_nothing_when_prepare_fails() {
        let (mut db, _journal) = database();
        assert!(db.connect());

        assert!(db.prepare_stmt("broken", "SYNTAX ERROR").is_err());
        assert!(!db.has_stmt("broken"));
        assert!(matches!(
            db.execute_stmt("broken", values![]),
            Err(Error::UnknownStatement(_))
        ));
    }

    #[test]
    fn it_runs_transaction_sql() {
        let (mut db, journal) = database();
        assert!(db.connect());
        entries(&journal);

        assert!(db.begin_transaction());
        assert!(db.begin_exclusive_transaction());
        assert!(db.commit_transaction());
        assert!(db.rollback_transaction());

        assert_eq!(
            entries(&journal),
            [
                "BEGIN TRANSACTION;",
                "BEGIN IMMEDIATE;",
                "COMMIT;",
                "ROLLBACK;"
            ]
        );
    }

    #[test]
    fn it_queries_without_registering() -> anyhow::Result<()> {
        let (mut db, _journal) = database();
        assert!(db.connect());

        let rows = db.query("SELECT 1")?;
        assert_eq!(rows[0].get::<String, _>("query")?, "SELECT 1");
        assert!(!db.has_stmt(""));

        Ok(())
    }
}
