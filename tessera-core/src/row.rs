use std::ops::Index;
use std::slice;
use std::vec;

use crate::error::{Error, Result};
use crate::value::{FromValue, Value};

/// A [`Value`] together with the name of the column it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    name: String,
    value: Value,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}

/// A type that can be used to index into a [`Row`].
///
/// Implemented for `usize` (position) and `&str` (column name). Name lookups
/// return the first column with a matching name.
pub trait ColumnIndex: private_column_index::Sealed {
    /// Returns a valid position for `row`, or `Err` if this index is not valid.
    fn index(&self, row: &Row) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn index(&self, row: &Row) -> Result<usize> {
        if *self >= row.len() {
            return Err(Error::OutOfBounds {
                index: *self,
                len: row.len(),
            });
        }

        Ok(*self)
    }
}

impl ColumnIndex for &'_ str {
    fn index(&self, row: &Row) -> Result<usize> {
        row.columns
            .iter()
            .position(|column| column.name == *self)
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
    }
}

impl ColumnIndex for &'_ String {
    fn index(&self, row: &Row) -> Result<usize> {
        ColumnIndex::index(&self.as_str(), row)
    }
}

mod private_column_index {
    pub trait Sealed {}

    impl Sealed for usize {}
    impl Sealed for &'_ str {}
    impl Sealed for &'_ String {}
}

/// One record of a result set: an ordered list of named values.
///
/// Column order matches the order of the result set. Duplicate column names
/// are allowed (e.g. `SELECT users.name, products.name ...`); lookups by name
/// return the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<NamedValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Appends a column to the end of this row.
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push(NamedValue::new(name, value));
    }

    /// Returns the number of columns in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the value of the column at `index`.
    ///
    /// Fails with [`Error::ColumnNotFound`] for an unknown name and
    /// [`Error::OutOfBounds`] for a position past the end of the row.
    pub fn try_get<I: ColumnIndex>(&self, index: I) -> Result<&Value> {
        let position = index.index(self)?;

        Ok(&self.columns[position].value)
    }

    pub fn try_get_mut<I: ColumnIndex>(&mut self, index: I) -> Result<&mut Value> {
        let position = index.index(self)?;

        Ok(&mut self.columns[position].value)
    }

    /// Looks up a column and reads its value as `T`.
    ///
    /// ```rust
    /// # use tessera_core::{Row, Value};
    /// let mut row = Row::new();
    /// row.add("id", Value::Integer(1));
    ///
    /// let id: i64 = row.get("id")?;
    /// assert_eq!(id, 1);
    /// # Ok::<(), tessera_core::Error>(())
    /// ```
    pub fn get<T, I>(&self, index: I) -> Result<T>
    where
        T: FromValue,
        I: ColumnIndex,
    {
        self.try_get(index)?.get()
    }

    /// Consumes the row and moves the value of the column at `index` out of it.
    pub fn take<I: ColumnIndex>(mut self, index: I) -> Result<Value> {
        let position = index.index(&self)?;

        Ok(self.columns.swap_remove(position).value)
    }

    /// Returns the column names, in result-set order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.columns.iter().map(NamedValue::name)
    }

    pub fn iter(&self) -> slice::Iter<'_, NamedValue> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, NamedValue> {
        self.columns.iter_mut()
    }
}

impl Index<usize> for Row {
    type Output = Value;

    #[track_caller]
    fn index(&self, index: usize) -> &Value {
        self.try_get(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl Index<&'_ str> for Row {
    type Output = Value;

    #[track_caller]
    fn index(&self, name: &str) -> &Value {
        self.try_get(name).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl IntoIterator for Row {
    type Item = NamedValue;
    type IntoIter = vec::IntoIter<NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<'r> IntoIterator for &'r Row {
    type Item = &'r NamedValue;
    type IntoIter = slice::Iter<'r, NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<NamedValue> for Row {
    fn from_iter<T: IntoIterator<Item = NamedValue>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
