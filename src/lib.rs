#![cfg_attr(docsrs, feature(doc_cfg))]
//! One synchronous `Database` / `PreparedStatement` / `Row` / `Value` API over
//! SQLite, MariaDB (and MySQL) and PostgreSQL.
//!
//! ```rust,no_run
//! # #[cfg(feature = "_sqlite")]
//! # fn main() -> tessera::Result<()> {
//! use tessera::sqlite::Sqlite;
//! use tessera::{values, Database};
//!
//! let mut db = Database::new(Sqlite::memory());
//! db.connect();
//!
//! db.silent_query("CREATE TABLE users (name TEXT, email TEXT);");
//! db.prepare_stmt("add_user", "INSERT INTO users VALUES (?, ?);")?;
//! db.execute_stmt("add_user", values!["Alice", "alice@x.com"])?;
//!
//! let rows = db.query("SELECT name, email FROM users;")?;
//! assert_eq!(rows[0].get::<String, _>("name")?, "Alice");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "_sqlite"))]
//! # fn main() {}
//! ```

// Modules
pub use tessera_core::{arguments, backend, database, error, logger, options, row, rows, value};

// Types
pub use tessera_core::{
    Arguments, Backend, BoxDynError, ColumnIndex, ConnectOptions, Database, DatabaseError, Error,
    FromValue, LogSettings, NamedValue, PreparedStatement, Result, Row, Rows, Value, ValueType,
};

// Macros
pub use tessera_core::values;

#[cfg(feature = "_sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "_sqlite")))]
pub use tessera_sqlite::{self as sqlite, Sqlite, SqliteConnectOptions, SqliteDatabase};

#[cfg(feature = "mariadb")]
#[cfg_attr(docsrs, doc(cfg(feature = "mariadb")))]
pub use tessera_mariadb::{self as mariadb, MariaDb, MariaDbConnectOptions, MariaDbDatabase};

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub use tessera_postgres::{self as postgres, PgConnectOptions, PgDatabase, Postgres};
