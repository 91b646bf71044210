//! Core of tessera: the value and row model, the error type and the
//! backend-agnostic [`Database`] connection state machine.
//!
//! Not intended to be used directly; see the `tessera` crate.
#![warn(future_incompatible, rust_2018_idioms)]

#[macro_use]
pub mod error;

pub mod arguments;
pub mod backend;
pub mod database;
pub mod io;
#[macro_use]
pub mod logger;
#[doc(hidden)]
pub mod mock;
pub mod net;
pub mod options;
pub mod row;
pub mod rows;
pub mod statement;
pub mod value;

pub use arguments::Arguments;
pub use backend::Backend;
pub use database::Database;
pub use error::{BoxDynError, DatabaseError, Error, Result};
pub use logger::LogSettings;
pub use net::Socket;
pub use options::ConnectOptions;
pub use row::{ColumnIndex, NamedValue, Row};
pub use rows::Rows;
pub use statement::PreparedStatement;
pub use value::{FromValue, Value, ValueType};

pub use bytes;
pub use url;
