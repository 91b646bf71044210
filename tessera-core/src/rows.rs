use std::ops::Index;
use std::slice;
use std::vec;

use crate::error::{Error, Result};
use crate::row::Row;

/// The complete, materialized result of one query execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    rows: Vec<Row>,
}

impl Rows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row to the end of the result.
    pub fn add(&mut self, row: Row) {
        self.rows.push(row);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `index`, or [`Error::OutOfBounds`].
    pub fn try_get(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(Error::OutOfBounds {
            index,
            len: self.rows.len(),
        })
    }

    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl Index<usize> for Rows {
    type Output = Row;

    #[track_caller]
    fn index(&self, index: usize) -> &Row {
        self.try_get(index).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'r> IntoIterator for &'r Rows {
    type Item = &'r Row;
    type IntoIter = slice::Iter<'r, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<Row> for Rows {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Row>> for Rows {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::Rows;
    use crate::{Error, Row, Value};

    fn user(id: i32, name: &str) -> Row {
        let mut row = Row::new();
        row.add("id", Value::Integer(id));
        row.add("name", Value::Text(name.into()));
        row
    }

    #[test]
    fn it_keeps_rows_in_order() -> anyhow::Result<()> {
        let mut rows = Rows::new();
        assert!(rows.is_empty());

        rows.add(user(1, "Alice"));
        rows.add(user(2, "Bob"));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.try_get(0)?.get::<String, _>("name")?, "Alice");
        assert_eq!(rows[1].get::<i32, _>("id")?, 2);

        let reversed: Vec<i32> = rows
            .iter()
            .rev()
            .map(|row| row.get("id"))
            .collect::<Result<_, _>>()?;

        assert_eq!(reversed, [2, 1]);

        Ok(())
    }

    #[test]
    fn it_fails_past_the_end() {
        let rows: Rows = vec![user(1, "Alice")].into();

        assert!(matches!(
            rows.try_get(1),
            Err(Error::OutOfBounds { index: 1, len: 1 })
        ));
    }

    #[test]
    #[should_panic(expected = "the len is 0, but the index is 0")]
    fn it_panics_when_indexing_an_empty_result() {
        let _ = &Rows::new()[0];
    }

    #[test]
    fn it_collects_and_consumes() {
        let rows: Rows = (1..=3).map(|id| user(id, "x")).collect();

        let mut count = 0;
        for row in &rows {
            assert_eq!(row.len(), 2);
            count += 1;
        }
        assert_eq!(count, 3);

        let owned: Vec<Row> = rows.into_iter().collect();
        assert_eq!(owned.len(), 3);
    }
}
