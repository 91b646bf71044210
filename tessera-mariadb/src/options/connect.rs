use tessera_core::ConnectOptions;
use url::Url;

use crate::error::Error;
use crate::{MariaDb, MariaDbConnectOptions};

impl ConnectOptions for MariaDbConnectOptions {
    type Backend = MariaDb;

    fn from_url(url: &Url) -> Result<Self, Error> {
        Self::parse_from_url(url)
    }

    fn to_backend(&self) -> MariaDb {
        MariaDb::with_options(self.clone())
    }
}
