//! **SQLite** backend for tessera.
//!
//! ### Note: linkage is semver-exempt.
//! This backend uses the `libsqlite3-sys` crate which links the native library for SQLite 3.
//! With the "sqlite" feature of `tessera`, the `bundled` feature is enabled which builds and
//! links SQLite from source.
//!
//! Due to Cargo's requirement that only one version of a crate that links a given native library
//! exists in the dependency graph at a time, using tessera alongside another crate linking
//! `libsqlite3-sys` like `rusqlite` is a semver hazard.
//!
//! ### Dynamic linking
//! To dynamically link to a system SQLite library, the "sqlite-unbundled" feature can be used
//! instead. Version `3.20.0` or newer is required for `sqlite3_prepare_v3`.

// SQLite is a C library. All interactions require FFI which is unsafe.
// All unsafe blocks should point to the SQLite docs for the invariants they rely on.
#![allow(unsafe_code)]

#[macro_use]
extern crate tessera_core;

pub use connection::Sqlite;
pub use error::SqliteError;
pub use options::SqliteConnectOptions;
pub use statement::SqliteStatement;

mod connection;
mod error;
mod options;
mod statement;

/// A [`Database`](tessera_core::Database) backed by SQLite.
pub type SqliteDatabase = tessera_core::Database<Sqlite>;
