//! Prepared statements.

use sqlx::query::Query;
use sqlx::{Encode, Type};

use super::value::Value;

/// A statement validated by the server, ready for `Database::execute`.
///
/// Holds the SQL plus the shape the driver reported at prepare time. The
/// driver caches the server-side statement per connection, so re-executing the
/// same `PreparedStatement` does not re-parse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    sql: String,
    columns: Vec<String>,
    parameter_count: Option<usize>,
}

impl PreparedStatement {
    pub(crate) fn new(sql: String, columns: Vec<String>, parameter_count: Option<usize>) -> Self {
        Self {
            sql,
            columns,
            parameter_count,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Result columns, empty for statements that return no rows.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of placeholders, when the driver reports it.
    pub fn parameter_count(&self) -> Option<usize> {
        self.parameter_count
    }

    /// Builds a sqlx query for this statement with `params` bound in order.
    pub(crate) fn bind<'q, DB>(
        &'q self,
        params: &[Value],
    ) -> Query<'q, DB, <DB as sqlx::Database>::Arguments<'q>>
    where
        DB: sqlx::Database,
        i64: Encode<'q, DB> + Type<DB>,
        f64: Encode<'q, DB> + Type<DB>,
        String: Encode<'q, DB> + Type<DB>,
        Vec<u8>: Encode<'q, DB> + Type<DB>,
        Option<String>: Encode<'q, DB> + Type<DB>,
    {
        params
            .iter()
            .fold(sqlx::query::<DB>(&self.sql), |query, value| match value {
                Value::Null => query.bind(None::<String>),
                Value::Integer(i) => query.bind(*i),
                Value::Real(r) => query.bind(*r),
                Value::Text(s) => query.bind(s.clone()),
                Value::Blob(b) => query.bind(b.clone()),
            })
    }
}
