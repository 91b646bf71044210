use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

pub(crate) use tessera_core::error::*;

use crate::protocol::response::ErrPacket;

/// An error returned from the MariaDB or MySQL server, or raised by the
/// client with a server-compatible error number.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct MariaDbDatabaseError(pub(crate) ErrPacket);

impl MariaDbDatabaseError {
    pub(crate) fn new(code: u16, message: &str) -> Self {
        Self(ErrPacket::new(code, message))
    }

    pub(crate) fn malformed_packet(message: &str) -> Self {
        Self::new(2027, &format!("Malformed packet: {message}"))
    }

    /// The server error number, e.g. `1146` for `ER_NO_SUCH_TABLE`.
    ///
    /// <https://mariadb.com/kb/en/mariadb-error-codes/>
    pub fn number(&self) -> u16 {
        self.0.error_code
    }

    /// The five-character SQLSTATE, when the server sent one.
    pub fn sql_state(&self) -> Option<&str> {
        self.0.sql_state.as_deref()
    }
}

impl DatabaseError for MariaDbDatabaseError {
    #[inline]
    fn message(&self) -> &str {
        &self.0.error_message
    }

    #[inline]
    fn code(&self) -> Option<Cow<'_, str>> {
        self.0.sql_state.as_deref().map(Cow::Borrowed)
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

impl Display for MariaDbDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0.sql_state {
            Some(state) => write!(f, "{} ({}): {}", self.0.error_code, state, self.message()),
            None => write!(f, "{}: {}", self.0.error_code, self.message()),
        }
    }
}

impl StdError for MariaDbDatabaseError {}
