use std::borrow::Cow;
use std::ffi::{c_int, CString};
use std::io;
use std::path::{Path, PathBuf};

use libsqlite3_sys::{
    SQLITE_OPEN_CREATE, SQLITE_OPEN_MEMORY, SQLITE_OPEN_NOMUTEX, SQLITE_OPEN_READONLY,
    SQLITE_OPEN_READWRITE,
};

use crate::error::Error;

mod connect;
mod parse;

/// Options and flags which can be used to configure a SQLite connection.
///
/// A value of `SqliteConnectOptions` can be parsed from a connection URL:
///
/// | URL | Description |
/// | -- | -- |
/// `sqlite::memory:` | Open an in-memory database. |
/// `sqlite:data.db` | Open the file `data.db` in the current directory. |
/// `sqlite://data.db` | Open the file `data.db` in the current directory. |
/// `sqlite:///data.db` | Open the file `data.db` from the root (`/`) directory. |
/// `sqlite://data.db?mode=ro` | Open the file `data.db` for read-only access. |
/// `sqlite://data.db?foreign_keys=true` | Enforce foreign keys on every connect. |
///
/// ```rust,no_run
/// # use std::str::FromStr;
/// # use tessera_core::{ConnectOptions, Database};
/// # use tessera_sqlite::SqliteConnectOptions;
/// # fn main() -> tessera_core::Result<()> {
/// let db = SqliteConnectOptions::from_str("sqlite://data.db")?
///     .create_if_missing(true)
///     .foreign_keys(true)
///     .connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SqliteConnectOptions {
    pub(crate) filename: Cow<'static, Path>,
    pub(crate) in_memory: bool,
    pub(crate) read_only: bool,
    pub(crate) create_if_missing: bool,
    pub(crate) foreign_keys: bool,
}

impl Default for SqliteConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteConnectOptions {
    /// Construct `Self` with default options.
    ///
    /// See the source of this method for the current defaults.
    pub fn new() -> Self {
        Self {
            filename: Cow::Borrowed(Path::new(":memory:")),
            in_memory: true,
            read_only: false,
            create_if_missing: true,
            foreign_keys: false,
        }
    }

    /// Sets the name of the database file.
    pub fn filename(mut self, file_name: impl AsRef<Path>) -> Self {
        let file_name = file_name.as_ref();

        self.in_memory = file_name == Path::new(":memory:");
        self.filename = Cow::Owned(file_name.to_path_buf());
        self
    }

    /// Gets the current name of the database file.
    pub fn get_filename(&self) -> &Path {
        &self.filename
    }

    /// Sets the access mode to open the database for read-only access.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the access mode to create the database file if the file does not exist.
    ///
    /// By default, a new file **will be created** if one is not found.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Runs `PRAGMA foreign_keys = ON;` after every connect.
    ///
    /// SQLite leaves foreign key enforcement off by default.
    pub fn foreign_keys(mut self, on: bool) -> Self {
        self.foreign_keys = on;
        self
    }

    pub(crate) fn open_params(&self) -> Result<(CString, c_int), Error> {
        let filename = self.filename.to_str().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "filename passed to SQLite must be valid UTF-8",
            )
        })?;

        // [SQLITE_OPEN_NOMUTEX] makes [sqlite3_open_v2] fail rather than hand out
        // a connection that takes a mutex on every call
        let mut flags = SQLITE_OPEN_NOMUTEX;

        flags |= if self.read_only {
            SQLITE_OPEN_READONLY
        } else if self.create_if_missing {
            SQLITE_OPEN_CREATE | SQLITE_OPEN_READWRITE
        } else {
            SQLITE_OPEN_READWRITE
        };

        if self.in_memory {
            flags |= SQLITE_OPEN_MEMORY;
        }

        let filename = CString::new(filename).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "filename passed to SQLite must not contain nul bytes",
            )
        })?;

        Ok((filename, flags))
    }
}

impl From<PathBuf> for SqliteConnectOptions {
    fn from(path: PathBuf) -> Self {
        Self::new().filename(path)
    }
}
