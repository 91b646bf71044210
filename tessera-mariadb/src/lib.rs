//! **MariaDB** and **MySQL** backend for tessera.
//!
//! Speaks the client/server protocol directly over a blocking TCP socket;
//! no native client library is linked.
//!
//! Supported authentication plugins are `mysql_native_password`,
//! `caching_sha2_password` and `sha256_password`. TLS is not supported, so
//! the latter two fall back to RSA encryption of the password using the
//! server's public key.

#[macro_use]
extern crate tessera_core;

pub use connection::MariaDb;
pub use error::MariaDbDatabaseError;
pub use options::MariaDbConnectOptions;
pub use statement::MariaDbStatement;

mod connection;
mod error;
mod io;
mod options;
mod protocol;
mod statement;

/// A [`Database`](tessera_core::Database) backed by MariaDB or MySQL.
pub type MariaDbDatabase = tessera_core::Database<MariaDb>;
