//! Buffered result sets.

use std::collections::VecDeque;

use super::attributes::ColumnCase;
use super::value::{DecodeRow, Row, Value};

/// Rows produced by `Database::query`, consumed front to back.
///
/// Rows are fully buffered when the query runs, so the connection is free for
/// the next statement while a `ResultSet` is still being read. Column names are
/// taken from the first row; an empty result reports no columns.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: VecDeque<Row>,
    closed: bool,
}

impl ResultSet {
    /// Builds a result set from already decoded rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.columns().to_vec())
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into(),
            closed: false,
        }
    }

    pub(crate) fn decode<R: DecodeRow>(rows: &[R], case: ColumnCase) -> Result<Self, sqlx::Error> {
        let decoded = rows
            .iter()
            .map(|row| Row::decode(row, case))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(decoded))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows not fetched yet.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Next row, or `None` when exhausted or closed.
    pub fn fetch(&mut self) -> Option<Row> {
        if self.closed {
            return None;
        }
        self.rows.pop_front()
    }

    /// All remaining rows.
    pub fn fetch_all(&mut self) -> Vec<Row> {
        if self.closed {
            return Vec::new();
        }
        self.rows.drain(..).collect()
    }

    /// Column `index` of the next row.
    pub fn fetch_column(&mut self, index: usize) -> Option<Value> {
        let row = self.fetch()?;
        row.values().get(index).cloned()
    }

    /// Discards remaining rows; later fetches return nothing.
    pub fn close_cursor(&mut self) {
        self.rows.clear();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Iterator for ResultSet {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.fetch()
    }
}
