//! Types for working with errors produced by tessera.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::Display;
use std::io;
use std::result::Result as StdResult;

/// A specialized `Result` type for tessera.
pub type Result<T> = StdResult<T, Error>;

// Convenience type alias for usage within tessera.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a method can fail within tessera.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error occurred while parsing a connection string.
    #[error("error occurred while parsing a connection string: {0}")]
    ParseConnectOptions(#[source] BoxDynError),

    /// A [`Value`](crate::Value) was read as a type it does not hold, or the
    /// numeric conversion to that type would not be lossless.
    #[error("wrong value type: {0}")]
    WrongValueType(String),

    /// No column found for the given name.
    #[error("no column found for name: {0}")]
    ColumnNotFound(String),

    /// Column or row index was out of bounds.
    #[error("index out of bounds: the len is {len}, but the index is {index}")]
    OutOfBounds { index: usize, len: usize },

    /// The native connection could not be established.
    #[error("error occurred while connecting: {0}")]
    Connection(#[source] BoxDynError),

    /// Error returned from the database while preparing, binding, executing or
    /// fetching.
    #[error("error returned from database: {0}")]
    Database(Box<dyn DatabaseError>),

    /// No prepared statement is registered under the given name.
    #[error("unknown prepared statement: {0}")]
    UnknownStatement(String),

    /// The operation needs a live connection.
    #[error("database not connected")]
    NotConnected,

    /// `connect` was called on a database that is already connected.
    #[error("database already connected")]
    AlreadyConnected,

    /// A cell returned by the server could not be decoded into its column type.
    #[error("error occurred while decoding column {index}: {source}")]
    ColumnDecode {
        index: String,

        #[source]
        source: BoxDynError,
    },

    /// Error communicating with the database backend.
    #[error("error communicating with the server: {0}")]
    Io(#[from] io::Error),

    /// Unexpected or invalid data encountered while communicating with the database.
    ///
    /// This should indicate there is a programming error in a tessera driver or there
    /// is something corrupted with the connection to the database itself.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),
}

impl Error {
    pub fn into_database_error(self) -> Option<Box<dyn DatabaseError + 'static>> {
        match self {
            Error::Database(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_database_error(&self) -> Option<&(dyn DatabaseError + 'static)> {
        match self {
            Error::Database(err) => Some(&**err),
            _ => None,
        }
    }

    #[inline]
    pub fn protocol(err: impl Display) -> Self {
        Error::Protocol(err.to_string())
    }

    #[inline]
    pub fn connection(err: impl Into<BoxDynError>) -> Self {
        Error::Connection(err.into())
    }

    #[inline]
    pub fn decode(index: impl Display, err: impl Into<BoxDynError>) -> Self {
        Error::ColumnDecode {
            index: index.to_string(),
            source: err.into(),
        }
    }

    /// Wraps this error as a connection failure, unless it already is one.
    pub fn into_connection_error(self) -> Self {
        match self {
            Error::Connection(_) => self,
            other => Error::Connection(Box::new(other)),
        }
    }
}

/// An error that was returned from the database.
pub trait DatabaseError: 'static + Send + Sync + StdError {
    /// The primary, human-readable error message.
    fn message(&self) -> &str;

    /// The backend-specific error code (SQLSTATE, MySQL error number or SQLite
    /// extended result code).
    fn code(&self) -> Option<Cow<'_, str>> {
        None
    }

    #[doc(hidden)]
    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static);

    #[doc(hidden)]
    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static>;
}

impl dyn DatabaseError {
    /// Downcast a reference to this generic database error to a specific
    /// database error type.
    ///
    /// # Panics
    ///
    /// Panics if the database error type is not `E`. In other cases, use
    /// `try_downcast_ref`.
    pub fn downcast_ref<E: DatabaseError>(&self) -> &E {
        self.try_downcast_ref().unwrap_or_else(|| {
            panic!("downcast to wrong DatabaseError type; original error: {self}")
        })
    }

    /// Downcast a reference to this generic database error to a specific
    /// database error type.
    #[inline]
    pub fn try_downcast_ref<E: DatabaseError>(&self) -> Option<&E> {
        self.as_error().downcast_ref()
    }

    /// Downcast this generic database error to a specific database error type.
    #[inline]
    pub fn try_downcast<E: DatabaseError>(self: Box<Self>) -> StdResult<Box<E>, Box<Self>> {
        if self.as_error().is::<E>() {
            self.into_error()
                .downcast()
                .map_err(|_| unreachable!("type was checked above"))
        } else {
            Err(self)
        }
    }
}

impl<E> From<E> for Error
where
    E: DatabaseError,
{
    #[inline]
    fn from(error: E) -> Self {
        Error::Database(Box::new(error))
    }
}

/// Format an error message as a `Protocol` error.
#[macro_export]
macro_rules! err_protocol {
    ($($fmt_args:tt)*) => {
        $crate::error::Error::Protocol(format!($($fmt_args)*))
    };
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt::{self, Display, Formatter};

    use super::{DatabaseError, Error};

    #[derive(Debug)]
    struct TestError(&'static str);

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for TestError {}

    impl DatabaseError for TestError {
        fn message(&self) -> &str {
            self.0
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some("42".into())
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn it_downcasts_database_errors() {
        let err: Error = TestError("no such table: users").into();

        let db = err.as_database_error().unwrap();
        assert_eq!(db.message(), "no such table: users");
        assert_eq!(db.code().as_deref(), Some("42"));
        assert!(db.try_downcast_ref::<TestError>().is_some());

        let boxed = err.into_database_error().unwrap();
        let concrete = boxed.try_downcast::<TestError>().unwrap();
        assert_eq!(concrete.0, "no such table: users");
    }

    #[test]
    fn it_formats_protocol_errors() {
        let err = err_protocol!("unexpected packet 0x{:02x}", 0xfe_u8);

        assert_eq!(
            err.to_string(),
            "encountered unexpected or invalid data: unexpected packet 0xfe"
        );

        let method = 7;
        let err = err_protocol!("unsupported authentication method: {method}");

        assert_eq!(
            err.to_string(),
            "encountered unexpected or invalid data: unsupported authentication method: 7"
        );
    }

    #[test]
    fn it_wraps_connection_errors_once() {
        let err = Error::NotConnected.into_connection_error();
        assert!(matches!(err, Error::Connection(_)));

        let err = err.into_connection_error();
        match err {
            Error::Connection(inner) => assert_eq!(inner.to_string(), "database not connected"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
