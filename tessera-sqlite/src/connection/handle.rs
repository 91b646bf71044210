use std::ffi::{c_int, CStr, CString};
use std::ptr::NonNull;
use std::{io, ptr};

use libsqlite3_sys::{
    sqlite3, sqlite3_close, sqlite3_exec, sqlite3_extended_result_codes, sqlite3_open_v2,
    SQLITE_OK,
};

use crate::error::Error;
use crate::SqliteError;

/// Managed SQLite3 database handle.
/// The database handle will be closed when this is dropped.
#[derive(Debug)]
pub(crate) struct ConnectionHandle(NonNull<sqlite3>);

impl ConnectionHandle {
    pub(crate) fn open(filename: &CStr, flags: c_int) -> Result<Self, Error> {
        let mut handle = ptr::null_mut();

        // <https://www.sqlite.org/c3ref/open.html>
        let status = unsafe { sqlite3_open_v2(filename.as_ptr(), &mut handle, flags, ptr::null()) };

        // SAFETY: the database is still initialized as long as the pointer is not `NULL`.
        // We need to close it even if there's an error.
        let handle = Self(NonNull::new(handle).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "SQLite is unable to allocate memory to hold the sqlite3 object",
            ))
        })?);

        if status != SQLITE_OK {
            return Err(Error::Database(Box::new(handle.last_error())));
        }

        // Enable extended result codes
        // https://www.sqlite.org/c3ref/extended_result_codes.html
        unsafe {
            // only fails with `SQLITE_ENABLE_API_ARMOR` and a NULL or closed handle
            sqlite3_extended_result_codes(handle.as_ptr(), 1);
        }

        Ok(handle)
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut sqlite3 {
        self.0.as_ptr()
    }

    pub(crate) fn last_error(&self) -> SqliteError {
        SqliteError::new(self.as_ptr())
    }

    /// Runs one or more `;`-separated statements, discarding any rows.
    pub(crate) fn exec(&self, query: &str) -> Result<(), Error> {
        let query = CString::new(query).map_err(|_| err_protocol!("query contains nul bytes"))?;

        // https://www.sqlite.org/c3ref/exec.html
        let status = unsafe {
            sqlite3_exec(
                self.as_ptr(),
                query.as_ptr(),
                // callback if we wanted result rows
                None,
                // callback data
                ptr::null_mut(),
                // out-pointer for the error message, we just use `SqliteError::new()`
                ptr::null_mut(),
            )
        };

        if status == SQLITE_OK {
            Ok(())
        } else {
            Err(self.last_error().into())
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        // https://sqlite.org/c3ref/close.html
        //
        // fails with `SQLITE_BUSY` while a statement is left unfinalized;
        // `Database` clears its registry before the backend disconnects
        let status = unsafe { sqlite3_close(self.as_ptr()) };

        if status != SQLITE_OK {
            log::error!("failed to close SQLite database: {}", self.last_error());
        }
    }
}
