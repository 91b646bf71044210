use tessera_core::ConnectOptions;
use url::Url;

use crate::error::Error;
use crate::{PgConnectOptions, Postgres};

impl ConnectOptions for PgConnectOptions {
    type Backend = Postgres;

    fn from_url(url: &Url) -> Result<Self, Error> {
        Self::parse_from_url(url)
    }

    fn to_backend(&self) -> Postgres {
        Postgres::with_options(self.clone())
    }
}
