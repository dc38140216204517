//! Column values and rows returned by the facade.
//!
//! Rows are decoded eagerly out of the driver's row type so callers never
//! deal with driver-specific types. Values without a natural integer, float or
//! binary mapping (dates, decimals, JSON, enums) come back as text, the way the
//! server renders them.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::{PgRow, PgValueFormat};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as SqlxRow, ValueRef};

use super::attributes::ColumnCase;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    Null,
    /// Any integer column (booleans decode as 0/1)
    Integer(i64),
    /// Floating point column
    Real(f64),
    /// Character data
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of the value; numeric text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrowed text, only for `Value::Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Driver rows that can be decoded into [`Value`]s.
pub(crate) trait DecodeRow: SqlxRow {
    /// Decodes column `index`.
    fn decode_value(&self, index: usize) -> Result<Value, sqlx::Error>;
}

impl DecodeRow for SqliteRow {
    fn decode_value(&self, index: usize) -> Result<Value, sqlx::Error> {
        if self.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }
        if let Ok(v) = self.try_get::<i64, _>(index) {
            return Ok(Value::Integer(v));
        }
        if let Ok(v) = self.try_get::<f64, _>(index) {
            return Ok(Value::Real(v));
        }
        if let Ok(v) = self.try_get::<String, _>(index) {
            return Ok(Value::Text(v));
        }
        self.try_get::<Vec<u8>, _>(index).map(Value::Blob)
    }
}

impl DecodeRow for MySqlRow {
    fn decode_value(&self, index: usize) -> Result<Value, sqlx::Error> {
        if self.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }
        // TINYINT(1), MEDIUMINT and friends all land here
        if let Ok(v) = self.try_get::<i64, _>(index) {
            return Ok(Value::Integer(v));
        }
        if let Ok(v) = self.try_get::<u64, _>(index) {
            return Ok(i64::try_from(v).map_or_else(|_| Value::Text(v.to_string()), Value::Integer));
        }
        if let Ok(v) = self.try_get::<f64, _>(index) {
            return Ok(Value::Real(v));
        }
        if let Ok(v) = self.try_get::<String, _>(index) {
            return Ok(Value::Text(v));
        }
        if let Ok(v) = self.try_get::<Vec<u8>, _>(index) {
            return Ok(Value::Blob(v));
        }
        if let Ok(v) = self.try_get::<NaiveDateTime, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = self.try_get::<NaiveDate, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = self.try_get::<NaiveTime, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        // DECIMAL, JSON, ENUM, SET, YEAR, zero dates: sent as text
        match self.try_get_unchecked::<String, _>(index) {
            Ok(text) => Ok(Value::Text(text)),
            Err(_) => self.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Blob),
        }
    }
}

impl DecodeRow for PgRow {
    fn decode_value(&self, index: usize) -> Result<Value, sqlx::Error> {
        let raw = self.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let textual = matches!(raw.format(), PgValueFormat::Text);

        if let Ok(v) = self.try_get::<i64, _>(index) {
            return Ok(Value::Integer(v));
        }
        if let Ok(v) = self.try_get::<i32, _>(index) {
            return Ok(Value::Integer(i64::from(v)));
        }
        if let Ok(v) = self.try_get::<i16, _>(index) {
            return Ok(Value::Integer(i64::from(v)));
        }
        if let Ok(v) = self.try_get::<bool, _>(index) {
            return Ok(Value::Integer(i64::from(v)));
        }
        if let Ok(v) = self.try_get::<f64, _>(index) {
            return Ok(Value::Real(v));
        }
        if let Ok(v) = self.try_get::<f32, _>(index) {
            return Ok(Value::Real(f64::from(v)));
        }
        if let Ok(v) = self.try_get::<String, _>(index) {
            return Ok(Value::Text(v));
        }
        if let Ok(v) = self.try_get::<Vec<u8>, _>(index) {
            return Ok(Value::Blob(v));
        }
        if textual {
            // simple-protocol results: keep the server's rendering
            return self.try_get_unchecked::<String, _>(index).map(Value::Text);
        }
        if let Ok(v) = self.try_get::<NaiveDateTime, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = self.try_get::<DateTime<Utc>, _>(index) {
            return Ok(Value::Text(format!("{}+00", v.naive_utc())));
        }
        if let Ok(v) = self.try_get::<NaiveDate, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        if let Ok(v) = self.try_get::<NaiveTime, _>(index) {
            return Ok(Value::Text(v.to_string()));
        }
        // binary NUMERIC, UUID, JSONB, ...: hand back the wire bytes
        self.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Blob)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One fetched row: column names in select order, paired with values.
///
/// Serializes as a JSON object whose keys keep the select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Builds a row from parallel column and value lists.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub(crate) fn decode<R: DecodeRow>(row: &R, case: ColumnCase) -> Result<Self, sqlx::Error> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (index, column) in row.columns().iter().enumerate() {
            columns.push(case.apply(column.name()));
            values.push(row.decode_value(index)?);
        }
        Ok(Self { columns, values })
    }

    /// Value of the named column (exact match on the possibly case-folded name).
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Value at a zero-based position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(column, value)` pairs in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Consumes the row, returning the first column's value.
    pub(crate) fn into_first(self) -> Option<Value> {
        self.values.into_iter().next()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
