use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

use bytes::Bytes;

pub(crate) use tessera_core::error::*;

use crate::io::ProtocolDecode;
use crate::message::{Notice, PgSeverity};

/// An error returned from the PostgreSQL database.
///
/// In PostgreSQL, an error is a notice with a severity of `ERROR` or higher.
/// Field descriptions are at
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>.
pub struct PgDatabaseError(pub(crate) Notice);

impl PgDatabaseError {
    /// An `ERROR` raised on the client, shaped like one from the server.
    pub(crate) fn client(code: &str, message: &str) -> Error {
        let body = format!("SERROR\0VERROR\0C{code}\0M{message}\0\0");

        match Notice::decode(Bytes::from(body)) {
            Ok(notice) => PgDatabaseError(notice).into(),
            Err(err) => err,
        }
    }

    #[inline]
    pub fn severity(&self) -> PgSeverity {
        self.0.severity()
    }

    /// The [SQLSTATE](https://www.postgresql.org/docs/current/errcodes-appendix.html)
    /// code for this error.
    #[inline]
    pub fn code(&self) -> &str {
        self.0.code()
    }

    /// The primary human-readable error message. This should be accurate
    /// but terse (typically one line).
    #[inline]
    pub fn message(&self) -> &str {
        self.0.message()
    }

    /// An optional secondary error message carrying more detail about the problem.
    #[inline]
    pub fn detail(&self) -> Option<&str> {
        self.0.get(b'D')
    }

    /// An optional suggestion what to do about the problem.
    #[inline]
    pub fn hint(&self) -> Option<&str> {
        self.0.get(b'H')
    }

    /// The name of the constraint, if the error was a constraint violation.
    #[inline]
    pub fn constraint(&self) -> Option<&str> {
        self.0.get(b'n')
    }

    /// The table the error is associated with, when there is one.
    #[inline]
    pub fn table(&self) -> Option<&str> {
        self.0.get(b't')
    }
}

impl Debug for PgDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDatabaseError")
            .field("severity", &self.severity())
            .field("code", &self.code())
            .field("message", &self.message())
            .field("detail", &self.detail())
            .field("hint", &self.hint())
            .field("constraint", &self.constraint())
            .field("table", &self.table())
            .finish()
    }
}

impl Display for PgDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.severity(), self.code(), self.message())
    }
}

impl StdError for PgDatabaseError {}

impl DatabaseError for PgDatabaseError {
    fn message(&self) -> &str {
        self.message()
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.code()))
    }

    #[doc(hidden)]
    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    #[doc(hidden)]
    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{DatabaseError, Error, PgDatabaseError};
    use crate::io::ProtocolDecode;
    use crate::message::{Notice, PgSeverity};

    #[test]
    fn it_exposes_error_fields() -> anyhow::Result<()> {
        const DATA: &[u8] = b"SERROR\0VERROR\0C23505\0Mduplicate key value violates unique constraint \"users_pkey\"\0DKey (id)=(1) already exists.\0spublic\0tusers\0nusers_pkey\0Fnbtinsert.c\0L664\0R_bt_check_unique\0\0";

        let err = PgDatabaseError(Notice::decode(Bytes::from_static(DATA))?);

        assert_eq!(err.severity(), PgSeverity::Error);
        assert_eq!(DatabaseError::code(&err).as_deref(), Some("23505"));
        assert_eq!(err.detail(), Some("Key (id)=(1) already exists."));
        assert_eq!(err.constraint(), Some("users_pkey"));
        assert_eq!(err.table(), Some("users"));
        assert_eq!(err.hint(), None);
        assert_eq!(
            err.to_string(),
            "ERROR (23505): duplicate key value violates unique constraint \"users_pkey\""
        );

        Ok(())
    }

    #[test]
    fn it_builds_client_side_errors() {
        let Error::Database(err) = PgDatabaseError::client("42601", "empty statement") else {
            panic!("expected a database error");
        };

        assert_eq!(err.code().as_deref(), Some("42601"));
        assert_eq!(err.message(), "empty statement");
    }
}
