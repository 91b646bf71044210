//! **PostgreSQL** backend for tessera.
//!
//! Speaks the v3 frontend/backend protocol directly over a blocking TCP
//! socket. Queries go through the extended protocol with text-format
//! parameters and results; `silent_query` uses the simple protocol so it can
//! run several statements at once.
//!
//! Supported authentication methods are `trust`, `password`, `md5` and
//! `scram-sha-256`. TLS is not supported.

#[macro_use]
extern crate tessera_core;

pub use connection::Postgres;
pub use error::PgDatabaseError;
pub use message::PgSeverity;
pub use options::PgConnectOptions;
pub use statement::PgStatement;

mod connection;
mod error;
mod io;
mod message;
mod options;
mod row;
mod statement;

/// A [`Database`](tessera_core::Database) backed by PostgreSQL.
pub type PgDatabase = tessera_core::Database<Postgres>;
