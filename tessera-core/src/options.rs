use std::fmt::Debug;
use std::str::FromStr;

use url::Url;

use crate::backend::Backend;
use crate::database::Database;
use crate::error::{Error, Result};

/// Options which can be used to configure how a backend connection is opened.
///
/// Connection options can be parsed from a connection URL of the following
/// general format:
///
/// ```text
/// scheme://[username[:password]@][host[:port]][/database][?options]
/// ```
///
/// The parsing of this URL is backend-dependent but the general form should
/// remain similar.
pub trait ConnectOptions: 'static + Sized + Debug + Clone + FromStr<Err = Error> {
    type Backend: Backend;

    /// Parse connection options from a parsed connection URL.
    fn from_url(url: &Url) -> Result<Self>;

    /// Parse connection options from a connection URL string.
    #[inline]
    fn parse(url: &str) -> Result<Self> {
        url.parse()
    }

    /// Build an unconnected backend configured with these options.
    fn to_backend(&self) -> Self::Backend;

    /// Build a backend from these options and connect a [`Database`] on top of it.
    fn connect(&self) -> Result<Database<Self::Backend>> {
        let mut database = Database::new(self.to_backend());

        database.try_connect()?;

        Ok(database)
    }
}

/// Parses `s` as a URL, mapping failures to [`Error::ParseConnectOptions`].
pub fn parse_url(s: &str) -> Result<Url> {
    s.parse::<Url>()
        .map_err(|err| Error::ParseConnectOptions(Box::new(err)))
}
