use std::str::FromStr;

use tessera_core::ConnectOptions;
use url::Url;

use crate::error::Error;
use crate::{Sqlite, SqliteConnectOptions};

impl ConnectOptions for SqliteConnectOptions {
    type Backend = Sqlite;

    fn from_url(url: &Url) -> Result<Self, Error> {
        // SQLite URL parsing is handled specially;
        // we want to treat the following URLs as equivalent:
        //
        // * sqlite:foo.db
        // * sqlite://foo.db
        //
        // If we used `Url::path()`, the latter would return an empty string
        // because `foo.db` gets parsed as the hostname.
        Self::from_str(url.as_str())
    }

    fn to_backend(&self) -> Sqlite {
        Sqlite::with_options(self.clone())
    }
}
