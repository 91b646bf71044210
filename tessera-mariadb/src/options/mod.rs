use std::time::Duration;

mod connect;
mod parse;

// text cells are always decoded as UTF-8
const UTF8_CHARSETS: [&str; 3] = ["utf8mb4", "utf8mb3", "utf8"];

pub(crate) fn is_utf8_charset(charset: &str) -> bool {
    UTF8_CHARSETS
        .iter()
        .any(|utf8| utf8.eq_ignore_ascii_case(charset))
}

/// Options and flags which can be used to configure a MariaDB or MySQL
/// connection.
///
/// A value of `MariaDbConnectOptions` can be parsed from a connection URL:
///
/// ```text
/// mariadb://[user[:password]@][host][:port][/database][?properties]
/// ```
///
/// `mysql://` is accepted as well. Supported properties:
///
/// | Property | Description |
/// | -- | -- |
/// | `charset` | `utf8mb4` (the default), `utf8mb3` or `utf8`. |
/// | `socket-timeout` | Read, write and connect timeout in seconds. |
///
/// ```rust,no_run
/// # use tessera_core::ConnectOptions;
/// # use tessera_mariadb::MariaDbConnectOptions;
/// # fn main() -> tessera_core::Result<()> {
/// let db = MariaDbConnectOptions::new()
///     .host("localhost")
///     .username("shop")
///     .password("secret")
///     .database("shop")
///     .connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MariaDbConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
    pub(crate) charset: String,
    pub(crate) socket_timeout: Option<Duration>,
}

impl Default for MariaDbConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MariaDbConnectOptions {
    /// Creates a default set of connection options.
    pub fn new() -> Self {
        Self {
            host: String::from("localhost"),
            port: 3306,
            username: whoami::username(),
            password: None,
            database: None,
            charset: String::from("utf8mb4"),
            socket_timeout: None,
        }
    }

    /// Sets the name of the host to connect to.
    ///
    /// The default behavior when the host is not specified,
    /// is to connect to localhost.
    pub fn host(mut self, host: &str) -> Self {
        host.clone_into(&mut self.host);
        self
    }

    /// Sets the port to connect to at the server host.
    ///
    /// The default port for MariaDB is `3306`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username to connect as.
    pub fn username(mut self, username: &str) -> Self {
        username.clone_into(&mut self.username);
        self
    }

    /// Sets the password to connect with.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    /// Sets the database name.
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_owned());
        self
    }

    /// Sets the character set for the connection.
    ///
    /// Only `utf8mb4`, `utf8mb3` and `utf8` are supported; connecting with
    /// any other charset fails. The handshake always negotiates `utf8mb4`;
    /// the narrower `utf8mb3` is applied with `SET NAMES` once connected.
    pub fn charset(mut self, charset: &str) -> Self {
        charset.clone_into(&mut self.charset);
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

    pub fn get_charset(&self) -> &str {
        &self.charset
    }
}
