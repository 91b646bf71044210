use std::ffi::c_void;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::ptr::NonNull;
use std::slice::from_raw_parts;
use std::str::from_utf8;

use libsqlite3_sys::{
    sqlite3, sqlite3_bind_blob64, sqlite3_bind_double, sqlite3_bind_int, sqlite3_bind_int64,
    sqlite3_bind_null, sqlite3_bind_text64, sqlite3_clear_bindings, sqlite3_column_blob,
    sqlite3_column_bytes, sqlite3_column_count, sqlite3_column_double, sqlite3_column_int64,
    sqlite3_column_name, sqlite3_column_type, sqlite3_db_handle, sqlite3_finalize,
    sqlite3_prepare_v3, sqlite3_reset, sqlite3_step, sqlite3_stmt, SQLITE_BLOB, SQLITE_DONE,
    SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_MISUSE, SQLITE_OK, SQLITE_PREPARE_PERSISTENT,
    SQLITE_ROW, SQLITE_TEXT, SQLITE_TRANSIENT, SQLITE_UTF8,
};
use tessera_core::{Row, Value};

use crate::connection::ConnectionHandle;
use crate::error::{BoxDynError, Error};
use crate::SqliteError;

#[derive(Debug)]
pub(crate) struct StatementHandle(NonNull<sqlite3_stmt>);

macro_rules! expect_ret_valid {
    ($fn_name:ident($($args:tt)*)) => {{
        let val = $fn_name($($args)*);

        TryFrom::try_from(val)
            // signed integer overflow is UB in C, so this means SQLite itself is broken
            .unwrap_or_else(|_| panic!("{}() returned invalid value: {val:?}", stringify!($fn_name)))
    }}
}

macro_rules! check_col_idx {
    ($idx:ident) => {
        c_int::try_from($idx).unwrap_or_else(|_| panic!("invalid column index: {}", $idx))
    };
}

impl StatementHandle {
    /// Compiles the first statement of `query`.
    ///
    /// Returns `Ok(None)` when `query` holds no statement at all (only
    /// whitespace or comments).
    pub(crate) fn prepare(
        connection: &ConnectionHandle,
        query: &str,
        persistent: bool,
    ) -> Result<Option<Self>, Error> {
        let query_len = c_int::try_from(query.len())
            .map_err(|_| err_protocol!("query string too large: {} bytes", query.len()))?;

        let mut handle: *mut sqlite3_stmt = ptr::null_mut();

        // SQLITE_PREPARE_PERSISTENT hints that the statement will be retained
        // for a long time and probably reused many times
        let flags = if persistent {
            SQLITE_PREPARE_PERSISTENT
        } else {
            0
        };

        // <https://www.sqlite.org/c3ref/prepare.html>
        let status = unsafe {
            sqlite3_prepare_v3(
                connection.as_ptr(),
                query.as_ptr() as *const c_char,
                query_len,
                flags as _,
                &mut handle,
                ptr::null_mut(),
            )
        };

        if status != SQLITE_OK {
            return Err(connection.last_error().into());
        }

        Ok(NonNull::new(handle).map(Self))
    }

    #[inline]
    unsafe fn db_handle(&self) -> *mut sqlite3 {
        // O(c) access to the connection handle for this statement handle
        // https://sqlite.org/c3ref/db_handle.html
        sqlite3_db_handle(self.0.as_ptr())
    }

    #[inline]
    pub(crate) fn last_error(&self) -> SqliteError {
        unsafe { SqliteError::new(self.db_handle()) }
    }

    #[inline]
    pub(crate) fn column_count(&self) -> usize {
        // https://sqlite.org/c3ref/column_count.html
        unsafe { expect_ret_valid!(sqlite3_column_count(self.0.as_ptr())) }
    }

    pub(crate) fn column_name(&self, index: usize) -> Result<&str, BoxDynError> {
        // https://sqlite.org/c3ref/column_name.html
        unsafe {
            let name = sqlite3_column_name(self.0.as_ptr(), check_col_idx!(index));
            if name.is_null() {
                return Err("SQLite could not allocate the column name".into());
            }

            Ok(from_utf8(CStr::from_ptr(name).to_bytes())?)
        }
    }

    // Binding Values To Prepared Statements
    // https://www.sqlite.org/c3ref/bind_blob.html
    //
    // NOTE: the first host parameter has an index of 1, not 0.

    pub(crate) fn bind_value(&self, index: usize, value: &Value) -> Result<(), SqliteError> {
        let status = match value {
            Value::Null => self.bind_null(index),
            Value::Integer(v) => self.bind_int(index, *v),
            Value::UnsignedInteger(v) => self.bind_int64(index, i64::from(*v)),
            Value::LongInteger(v) => self.bind_int64(index, *v),

            // SQLite integers are signed 64-bit; anything larger is stored as text
            Value::UnsignedLongInteger(v) => match i64::try_from(*v) {
                Ok(v) => self.bind_int64(index, v),
                Err(_) => self.bind_text(index, &v.to_string()),
            },

            Value::Double(v) => self.bind_double(index, *v),
            Value::Text(v) => self.bind_text(index, v),
            Value::Blob(v) => self.bind_blob(index, v),
            Value::Boolean(v) => self.bind_int(index, i32::from(*v)),
        };

        if status == SQLITE_OK {
            Ok(())
        } else {
            Err(self.last_error())
        }
    }

    #[inline]
    fn bind_blob(&self, index: usize, v: &[u8]) -> c_int {
        unsafe {
            sqlite3_bind_blob64(
                self.0.as_ptr(),
                check_col_idx!(index),
                v.as_ptr() as *const c_void,
                v.len() as u64,
                SQLITE_TRANSIENT(),
            )
        }
    }

    #[inline]
    fn bind_text(&self, index: usize, v: &str) -> c_int {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let encoding = SQLITE_UTF8 as u8;

        unsafe {
            sqlite3_bind_text64(
                self.0.as_ptr(),
                check_col_idx!(index),
                v.as_ptr() as *const c_char,
                v.len() as u64,
                SQLITE_TRANSIENT(),
                encoding,
            )
        }
    }

    #[inline]
    fn bind_int(&self, index: usize, v: i32) -> c_int {
        unsafe { sqlite3_bind_int(self.0.as_ptr(), check_col_idx!(index), v as c_int) }
    }

    #[inline]
    fn bind_int64(&self, index: usize, v: i64) -> c_int {
        unsafe { sqlite3_bind_int64(self.0.as_ptr(), check_col_idx!(index), v) }
    }

    #[inline]
    fn bind_double(&self, index: usize, v: f64) -> c_int {
        unsafe { sqlite3_bind_double(self.0.as_ptr(), check_col_idx!(index), v) }
    }

    #[inline]
    fn bind_null(&self, index: usize) -> c_int {
        unsafe { sqlite3_bind_null(self.0.as_ptr(), check_col_idx!(index)) }
    }

    // result values from the query
    // https://www.sqlite.org/c3ref/column_blob.html

    #[inline]
    fn column_type(&self, index: usize) -> c_int {
        unsafe { sqlite3_column_type(self.0.as_ptr(), check_col_idx!(index)) }
    }

    #[inline]
    fn column_int64(&self, index: usize) -> i64 {
        unsafe { sqlite3_column_int64(self.0.as_ptr(), check_col_idx!(index)) }
    }

    #[inline]
    fn column_double(&self, index: usize) -> f64 {
        unsafe { sqlite3_column_double(self.0.as_ptr(), check_col_idx!(index)) }
    }

    fn column_blob(&self, index: usize) -> &[u8] {
        let len = unsafe {
            expect_ret_valid!(sqlite3_column_bytes(self.0.as_ptr(), check_col_idx!(index)))
        };

        if len == 0 {
            // empty blobs are NULL so just return an empty slice
            return &[];
        }

        let ptr =
            unsafe { sqlite3_column_blob(self.0.as_ptr(), check_col_idx!(index)) } as *const u8;
        debug_assert!(!ptr.is_null());

        unsafe { from_raw_parts(ptr, len) }
    }

    /// Reads the cell at `index` of the current row, typed by its storage class.
    pub(crate) fn column_value(&self, index: usize) -> Result<Value, BoxDynError> {
        Ok(match self.column_type(index) {
            SQLITE_INTEGER => {
                let v = self.column_int64(index);

                i32::try_from(v).map_or(Value::LongInteger(v), Value::Integer)
            }

            SQLITE_FLOAT => Value::Double(self.column_double(index)),

            // `sqlite3_column_blob` must come after `sqlite3_column_type` as it
            // may convert the stored value
            SQLITE_TEXT => Value::Text(from_utf8(self.column_blob(index))?.to_owned()),
            SQLITE_BLOB => Value::Blob(self.column_blob(index).to_vec()),

            _ => Value::Null,
        })
    }

    /// Reads every column of the current row.
    pub(crate) fn read_row(&self) -> Result<Row, Error> {
        let count = self.column_count();
        let mut row = Row::with_capacity(count);

        for index in 0..count {
            let name = self
                .column_name(index)
                .map_err(|err| Error::decode(index, err))?
                .to_owned();

            let value = self
                .column_value(index)
                .map_err(|err| Error::decode(&name, err))?;

            row.add(name, value);
        }

        Ok(row)
    }

    pub(crate) fn clear_bindings(&self) {
        unsafe { sqlite3_clear_bindings(self.0.as_ptr()) };
    }

    pub(crate) fn reset(&mut self) -> Result<(), SqliteError> {
        // SAFETY: we have exclusive access to the handle
        unsafe {
            if sqlite3_reset(self.0.as_ptr()) != SQLITE_OK {
                return Err(SqliteError::new(self.db_handle()));
            }
        }

        Ok(())
    }

    pub(crate) fn step(&mut self) -> Result<bool, SqliteError> {
        // SAFETY: we have exclusive access to the handle
        unsafe {
            match sqlite3_step(self.0.as_ptr()) {
                SQLITE_ROW => Ok(true),
                SQLITE_DONE => Ok(false),
                SQLITE_MISUSE => Err(SqliteError::misuse("sqlite3_step() called out of sequence")),
                _ => Err(SqliteError::new(self.db_handle())),
            }
        }
    }
}

impl Drop for StatementHandle {
    fn drop(&mut self) {
        // SAFETY: we have exclusive access to the `StatementHandle` here
        unsafe {
            // https://sqlite.org/c3ref/finalize.html
            let status = sqlite3_finalize(self.0.as_ptr());
            if status == SQLITE_MISUSE {
                // only returned for a detected double free
                panic!("Detected sqlite3_finalize misuse.");
            }
        }
    }
}
