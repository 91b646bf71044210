use std::env::var;
use std::time::Duration;

mod connect;
mod parse;

/// Options and flags which can be used to configure a PostgreSQL connection.
///
/// A value of `PgConnectOptions` can be parsed from a connection URL:
///
/// ```text
/// postgresql://[user[:password]@][host][:port][/dbname][?param1=value1&...]
/// ```
///
/// `postgres://` is accepted as well. Supported parameters:
///
/// | Parameter | Default | Description |
/// |-----------|---------|-------------|
/// | `application_name` | `None` | Reported to the server and shown in `pg_stat_activity`. |
/// | `connect_timeout` | `None` | Read, write and connect timeout in seconds. |
/// | `host` | `localhost` | Overrides the host of the URL. |
/// | `port` | `5432` | Overrides the port of the URL. |
/// | `user`, `password`, `dbname` | | Override the corresponding parts of the URL. |
///
/// Fields not set explicitly take their defaults from the environment, as
/// `libpq` does: `PGHOST` (or `PGHOSTADDR`), `PGPORT`, `PGUSER`,
/// `PGPASSWORD`, `PGDATABASE` and `PGAPPNAME`.
///
/// ```rust,no_run
/// # use tessera_core::ConnectOptions;
/// # use tessera_postgres::PgConnectOptions;
/// # fn main() -> tessera_core::Result<()> {
/// let db = PgConnectOptions::new()
///     .host("localhost")
///     .username("shop")
///     .password("secret")
///     .database("shop")
///     .connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PgConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
    pub(crate) application_name: Option<String>,
    pub(crate) socket_timeout: Option<Duration>,
}

impl Default for PgConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PgConnectOptions {
    /// Creates connection options with defaults read from the `PG*`
    /// environment variables.
    pub fn new() -> Self {
        let port = var("PGPORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5432);

        let host = var("PGHOSTADDR")
            .ok()
            .or_else(|| var("PGHOST").ok())
            .unwrap_or_else(|| String::from("localhost"));

        Self {
            host,
            port,
            username: var("PGUSER").ok().unwrap_or_else(whoami::username),
            password: var("PGPASSWORD").ok(),
            database: var("PGDATABASE").ok(),
            application_name: var("PGAPPNAME").ok(),
            socket_timeout: None,
        }
    }

    /// Creates connection options that ignore the environment.
    pub fn new_without_env() -> Self {
        Self {
            host: String::from("localhost"),
            port: 5432,
            username: String::from("postgres"),
            password: None,
            database: None,
            application_name: None,
            socket_timeout: None,
        }
    }

    /// Sets the name of the host to connect to.
    pub fn host(mut self, host: &str) -> Self {
        host.clone_into(&mut self.host);
        self
    }

    /// Sets the port to connect to at the server host.
    ///
    /// The default port for PostgreSQL is `5432`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username to connect as.
    ///
    /// Defaults to be the same as the operating system name of
    /// the user running the application.
    pub fn username(mut self, username: &str) -> Self {
        username.clone_into(&mut self.username);
        self
    }

    /// Sets the password to use if the server demands password authentication.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    /// Sets the database name. Defaults to be the same as the user name.
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_owned());
        self
    }

    /// Sets the application name, sent in the startup packet.
    pub fn application_name(mut self, application_name: &str) -> Self {
        self.application_name = Some(application_name.to_owned());
        self
    }

    /// Bounds connecting, reading and writing on the socket.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = Some(timeout);
        self
    }

    pub fn get_host(&self) -> &str {
        &self.host
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn get_application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }
}

#[test]
fn test_new_without_env() {
    let options = PgConnectOptions::new_without_env();

    assert_eq!(options.get_host(), "localhost");
    assert_eq!(options.get_port(), 5432);
    assert_eq!(options.get_username(), "postgres");
    assert_eq!(options.get_database(), None);
    assert_eq!(options.get_application_name(), None);
}
