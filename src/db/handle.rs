//! Native driver connections.
//!
//! Each backend keeps its own sqlx connection type so rows are decoded with
//! the driver's full type support instead of a lowest-common-denominator
//! mapping.

use sqlx::mysql::{MySql, MySqlConnection, MySqlQueryResult};
use sqlx::postgres::{PgConnection, PgQueryResult, Postgres};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteQueryResult};
use sqlx::{Column, Connection, Either, Executor, Statement};

use super::attributes::ColumnCase;
use super::dsn::Backend;
use super::result_set::ResultSet;
use super::statement::PreparedStatement;
use super::value::Value;

/// An open connection to one of the supported backends.
///
/// Returned by `Database::get_instance` for callers that need the driver
/// directly; going through it bypasses the facade's metrics.
#[derive(Debug)]
pub enum Handle {
    MySql(MySqlConnection),
    Postgres(PgConnection),
    Sqlite(SqliteConnection),
}

/// Result of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl From<MySqlQueryResult> for Executed {
    fn from(result: MySqlQueryResult) -> Self {
        Self {
            rows_affected: result.rows_affected(),
            last_insert_id: i64::try_from(result.last_insert_id()).ok(),
        }
    }
}

impl From<PgQueryResult> for Executed {
    fn from(result: PgQueryResult) -> Self {
        // ids come from sequences, see Database::last_insert_id
        Self {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
        }
    }
}

impl From<SqliteQueryResult> for Executed {
    fn from(result: SqliteQueryResult) -> Self {
        Self {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        }
    }
}

impl Handle {
    /// Opens a connection to `url` with the driver of `backend`.
    pub(crate) async fn connect(backend: Backend, url: &str) -> Result<Self, sqlx::Error> {
        Ok(match backend {
            Backend::MySql => Handle::MySql(MySqlConnection::connect(url).await?),
            Backend::Postgres => Handle::Postgres(PgConnection::connect(url).await?),
            Backend::Sqlite => Handle::Sqlite(SqliteConnection::connect(url).await?),
        })
    }

    pub fn backend(&self) -> Backend {
        match self {
            Handle::MySql(_) => Backend::MySql,
            Handle::Postgres(_) => Backend::Postgres,
            Handle::Sqlite(_) => Backend::Sqlite,
        }
    }

    /// Runs `sql` without parameters, discarding any rows.
    pub(crate) async fn execute(&mut self, sql: &str) -> Result<Executed, sqlx::Error> {
        match self {
            Handle::MySql(conn) => conn.execute(sql).await.map(Executed::from),
            Handle::Postgres(conn) => conn.execute(sql).await.map(Executed::from),
            Handle::Sqlite(conn) => conn.execute(sql).await.map(Executed::from),
        }
    }

    /// Runs `sql` without parameters and buffers every row.
    pub(crate) async fn fetch_all(
        &mut self,
        sql: &str,
        case: ColumnCase,
    ) -> Result<ResultSet, sqlx::Error> {
        match self {
            Handle::MySql(conn) => ResultSet::decode(&conn.fetch_all(sql).await?, case),
            Handle::Postgres(conn) => ResultSet::decode(&conn.fetch_all(sql).await?, case),
            Handle::Sqlite(conn) => ResultSet::decode(&conn.fetch_all(sql).await?, case),
        }
    }

    /// First column of the single row returned by `sql`.
    pub(crate) async fn fetch_i64(&mut self, sql: &str) -> Result<i64, sqlx::Error> {
        match self {
            Handle::MySql(conn) => sqlx::query_scalar(sql).fetch_one(&mut *conn).await,
            Handle::Postgres(conn) => sqlx::query_scalar(sql).fetch_one(&mut *conn).await,
            Handle::Sqlite(conn) => sqlx::query_scalar(sql).fetch_one(&mut *conn).await,
        }
    }

    pub(crate) async fn prepare(
        &mut self,
        sql: &str,
        case: ColumnCase,
    ) -> Result<PreparedStatement, sqlx::Error> {
        match self {
            Handle::MySql(conn) => conn.prepare(sql).await.map(|s| describe(sql, &s, case)),
            Handle::Postgres(conn) => conn.prepare(sql).await.map(|s| describe(sql, &s, case)),
            Handle::Sqlite(conn) => conn.prepare(sql).await.map(|s| describe(sql, &s, case)),
        }
    }

    pub(crate) async fn execute_prepared(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
    ) -> Result<Executed, sqlx::Error> {
        match self {
            Handle::MySql(conn) => statement
                .bind::<MySql>(params)
                .execute(&mut *conn)
                .await
                .map(Executed::from),
            Handle::Postgres(conn) => statement
                .bind::<Postgres>(params)
                .execute(&mut *conn)
                .await
                .map(Executed::from),
            Handle::Sqlite(conn) => statement
                .bind::<Sqlite>(params)
                .execute(&mut *conn)
                .await
                .map(Executed::from),
        }
    }

    pub(crate) async fn fetch_prepared(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
        case: ColumnCase,
    ) -> Result<ResultSet, sqlx::Error> {
        match self {
            Handle::MySql(conn) => {
                let rows = statement.bind::<MySql>(params).fetch_all(&mut *conn).await?;
                ResultSet::decode(&rows, case)
            }
            Handle::Postgres(conn) => {
                let rows = statement.bind::<Postgres>(params).fetch_all(&mut *conn).await?;
                ResultSet::decode(&rows, case)
            }
            Handle::Sqlite(conn) => {
                let rows = statement.bind::<Sqlite>(params).fetch_all(&mut *conn).await?;
                ResultSet::decode(&rows, case)
            }
        }
    }

    /// Closes the connection, flushing the driver's goodbye message.
    pub(crate) async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            Handle::MySql(conn) => conn.close().await,
            Handle::Postgres(conn) => conn.close().await,
            Handle::Sqlite(conn) => conn.close().await,
        }
    }
}

fn describe<'q, S: Statement<'q>>(sql: &str, statement: &S, case: ColumnCase) -> PreparedStatement {
    let columns = statement
        .columns()
        .iter()
        .map(|c| case.apply(c.name()))
        .collect();
    let parameter_count = statement.parameters().map(|p| match p {
        Either::Left(types) => types.len(),
        Either::Right(count) => count,
    });
    PreparedStatement::new(sql.to_string(), columns, parameter_count)
}
