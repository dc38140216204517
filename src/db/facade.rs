//! The database facade.
//!
//! [`Database`] owns at most one open connection and forwards calls to it,
//! counting every data operation (`exec`, `query`, `execute` and the fetch
//! helpers built on `query`) in its [`QueryStats`].
//!
//! A `Database` is an ordinary value: create one per configured target and
//! pass it by `&mut` to whatever needs it. Every call takes `&mut self`, so
//! sharing one across tasks requires the caller to wrap it in a mutex.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::attributes::{Attribute, AttributeValue, ColumnCase};
use super::dsn::{Backend, Dsn};
use super::handle::Handle;
use super::quote::{self, ParamType};
use super::result_set::ResultSet;
use super::statement::PreparedStatement;
use super::stats::QueryStats;
use super::value::{Row, Value};
use crate::config::{DatabaseConfig, AVAILABLE_DRIVERS, DEFAULT_MYSQLDUMP_BIN};
use crate::error_handling::{DatabaseError, ErrorInfo};

/// Connection arguments for [`Database::get_instance`].
///
/// `None` and empty values mean "keep whatever is already configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    pub dsn: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Driver options, appended to the connect URL as query parameters
    pub driver_options: BTreeMap<String, String>,
    pub prefix: Option<String>,
}

impl ConnectOptions {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            ..Default::default()
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn driver_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.driver_options.insert(key.into(), value.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Overwrites stored values with the non-empty values of `other`.
    fn merge(&mut self, other: ConnectOptions) {
        fn take(slot: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }
        take(&mut self.dsn, other.dsn);
        take(&mut self.username, other.username);
        take(&mut self.password, other.password);
        take(&mut self.prefix, other.prefix);
        if !other.driver_options.is_empty() {
            self.driver_options = other.driver_options;
        }
    }
}

/// Database facade: one lazily opened connection plus query metrics.
pub struct Database {
    settings: ConnectOptions,
    dsn: Option<Dsn>,
    handle: Option<Handle>,
    stats: Arc<QueryStats>,
    column_case: ColumnCase,
    last_error: ErrorInfo,
    last_insert_id: Option<i64>,
    in_transaction: bool,
    pub(super) dump_binary: String,
    pub(super) backup_path: Option<PathBuf>,
    pub(super) backup_format: Option<String>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // settings are left out: they hold the password
        f.debug_struct("Database")
            .field("backend", &self.backend())
            .field("connected", &self.is_connected())
            .field("in_transaction", &self.in_transaction)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Database {
    /// Creates an unconfigured, unconnected facade with private metrics.
    pub fn new() -> Self {
        Self::with_stats(Arc::new(QueryStats::new()))
    }

    /// Creates a facade that records into shared `stats`.
    pub fn with_stats(stats: Arc<QueryStats>) -> Self {
        Self {
            settings: ConnectOptions::default(),
            dsn: None,
            handle: None,
            stats,
            column_case: ColumnCase::default(),
            last_error: ErrorInfo::ok(),
            last_insert_id: None,
            in_transaction: false,
            dump_binary: DEFAULT_MYSQLDUMP_BIN.to_string(),
            backup_path: None,
            backup_format: None,
        }
    }

    /// Creates a facade pre-configured from `config`; nothing is opened yet.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let mut db = Self::new();
        db.configure(config.connect_options());
        if let Some(bin) = &config.mysqldump_bin {
            db.dump_binary = bin.clone();
        }
        db
    }

    /// Stores connection settings without connecting.
    ///
    /// Ignored while a connection is open, exactly like [`Database::get_instance`].
    pub fn configure(&mut self, options: ConnectOptions) {
        if self.handle.is_some() {
            debug!("Connection already open; ignoring new connection settings");
            return;
        }
        self.settings.merge(options);
    }

    /// Returns the open connection, connecting first if necessary.
    ///
    /// While no connection is open, every non-empty argument overwrites the
    /// stored setting and the rest keep their previous values. Once a
    /// connection exists the arguments are ignored and it is returned as is.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::MissingDsn` if no DSN was ever configured
    /// - `DatabaseError::InvalidDsn` if the DSN cannot be parsed
    /// - `DatabaseError::Sql` with the driver's error if connecting fails
    pub async fn get_instance(
        &mut self,
        options: ConnectOptions,
    ) -> Result<&mut Handle, DatabaseError> {
        if self.handle.is_none() {
            self.configure(options);
            self.connect().await?;
        } else {
            debug!("Reusing open {} connection", self.backend_name());
        }
        self.connection()
    }

    async fn connect(&mut self) -> Result<(), DatabaseError> {
        let raw = self.settings.dsn.as_deref().ok_or(DatabaseError::MissingDsn)?;
        let dsn = Dsn::parse(raw)?;
        let url = dsn.connect_url(
            self.settings.username.as_deref(),
            self.settings.password.as_deref(),
            &self.settings.driver_options,
        )?;

        info!(
            "Connecting to {} database {}",
            dsn.backend(),
            dsn.database().unwrap_or("(default)")
        );
        let conn = Handle::connect(dsn.backend(), &url).await;
        let conn = self.track(conn)?;

        self.dsn = Some(dsn);
        self.handle = Some(conn);
        self.in_transaction = false;
        Ok(())
    }

    /// The open connection.
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotConnected` if `get_instance` has not run or `free` closed it.
    pub fn connection(&mut self) -> Result<&mut Handle, DatabaseError> {
        self.handle.as_mut().ok_or(DatabaseError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Backend of the configured DSN, once a connection has been made.
    pub fn backend(&self) -> Option<Backend> {
        self.dsn.as_ref().map(Dsn::backend)
    }

    pub(super) fn dsn(&self) -> Option<&Dsn> {
        self.dsn.as_ref()
    }

    pub(super) fn settings(&self) -> &ConnectOptions {
        &self.settings
    }

    fn backend_name(&self) -> String {
        self.backend()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Records the outcome of a forwarded call in the error diagnostics.
    fn track<T>(&mut self, result: Result<T, sqlx::Error>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.last_error = ErrorInfo::ok();
                Ok(value)
            }
            Err(e) => {
                self.last_error = ErrorInfo::from_sqlx(&e);
                warn!("Database call failed: {e}");
                Err(DatabaseError::Sql(e))
            }
        }
    }

    /// Executes a statement directly and returns the number of affected rows.
    pub async fn exec(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let started = Instant::now();
        let result = conn.execute(sql).await;
        self.stats.record(started.elapsed());

        let done = self.track(result)?;
        self.last_insert_id = done.last_insert_id;
        Ok(done.rows_affected)
    }

    /// Runs a statement and returns its rows.
    pub async fn query(&mut self, sql: &str) -> Result<ResultSet, DatabaseError> {
        let case = self.column_case;
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let started = Instant::now();
        let result = conn.fetch_all(sql, case).await;
        self.stats.record(started.elapsed());

        self.track(result)
    }

    /// Prepares a statement for [`Database::execute`]. Not counted in the metrics.
    pub async fn prepare(&mut self, sql: &str) -> Result<PreparedStatement, DatabaseError> {
        let case = self.column_case;
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let prepared = conn.prepare(sql, case).await;
        self.track(prepared)
    }

    /// Executes a prepared statement with `params` bound in order and returns
    /// the number of affected rows.
    pub async fn execute(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
    ) -> Result<u64, DatabaseError> {
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let started = Instant::now();
        let result = conn.execute_prepared(statement, params).await;
        self.stats.record(started.elapsed());

        let done = self.track(result)?;
        self.last_insert_id = done.last_insert_id;
        Ok(done.rows_affected)
    }

    /// Runs a prepared statement with `params` and returns its rows.
    pub async fn query_prepared(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
    ) -> Result<ResultSet, DatabaseError> {
        let case = self.column_case;
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let started = Instant::now();
        let result = conn.fetch_prepared(statement, params, case).await;
        self.stats.record(started.elapsed());

        self.track(result)
    }

    /// Runs `sql` and returns every row.
    pub async fn query_fetch_all_assoc(&mut self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        Ok(self.query(sql).await?.fetch_all())
    }

    /// Runs `sql` and returns the first row, if any.
    pub async fn query_fetch_row_assoc(&mut self, sql: &str) -> Result<Option<Row>, DatabaseError> {
        Ok(self.query(sql).await?.fetch())
    }

    /// Runs `sql` and returns the first column of the first row, if any.
    pub async fn query_fetch_col_assoc(
        &mut self,
        sql: &str,
    ) -> Result<Option<Value>, DatabaseError> {
        Ok(self.query(sql).await?.fetch().and_then(Row::into_first))
    }

    async fn run_control(&mut self, sql: &'static str) -> Result<(), DatabaseError> {
        let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
        let result = conn.execute(sql).await;
        self.track(result).map(|_| ())
    }

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Transaction` if one is already open.
    pub async fn begin_transaction(&mut self) -> Result<(), DatabaseError> {
        if self.in_transaction {
            return Err(DatabaseError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        self.run_control("BEGIN").await?;
        self.in_transaction = true;
        debug!("Transaction started");
        Ok(())
    }

    /// Commits the open transaction.
    pub async fn commit(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Err(DatabaseError::Transaction(
                "no active transaction to commit".to_string(),
            ));
        }
        self.run_control("COMMIT").await?;
        self.in_transaction = false;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the open transaction.
    pub async fn roll_back(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Err(DatabaseError::Transaction(
                "no active transaction to roll back".to_string(),
            ));
        }
        self.run_control("ROLLBACK").await?;
        self.in_transaction = false;
        debug!("Transaction rolled back");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// SQLSTATE of the last forwarded call (`"00000"` on success).
    pub fn error_code(&self) -> &str {
        &self.last_error.sqlstate
    }

    /// Extended diagnostics of the last forwarded call.
    pub fn error_info(&self) -> &ErrorInfo {
        &self.last_error
    }

    /// Id of the last inserted row, as a string (`"0"` when unknown).
    ///
    /// With a sequence name on PostgreSQL the sequence's current value is
    /// queried; otherwise the id reported by the last `exec`/`execute` is used.
    pub async fn last_insert_id(&mut self, sequence: Option<&str>) -> Result<String, DatabaseError> {
        match (self.backend(), sequence.filter(|s| !s.is_empty())) {
            (Some(Backend::Postgres), Some(sequence)) => {
                let sql = format!(
                    "SELECT CAST(currval({}) AS BIGINT)",
                    quote::quote(sequence, ParamType::Str, Some(Backend::Postgres))
                );
                let conn = self.handle.as_mut().ok_or(DatabaseError::NotConnected)?;
                let id = conn.fetch_i64(&sql).await;
                Ok(self.track(id)?.to_string())
            }
            _ => Ok(self.last_insert_id.unwrap_or(0).to_string()),
        }
    }

    /// Quotes `input` as a literal for the connected backend.
    pub fn quote(&self, input: &str, param_type: ParamType) -> String {
        quote::quote(input, param_type, self.backend())
    }

    pub fn get_attribute(&self, attribute: Attribute) -> Result<AttributeValue, DatabaseError> {
        match attribute {
            Attribute::DriverName => self
                .backend()
                .map(|b| AttributeValue::Text(b.driver_name().to_string()))
                .ok_or(DatabaseError::NotConnected),
            Attribute::ColumnCase => Ok(AttributeValue::Case(self.column_case)),
            Attribute::InTransaction => Ok(AttributeValue::Bool(self.in_transaction)),
        }
    }

    pub fn set_attribute(
        &mut self,
        attribute: Attribute,
        value: AttributeValue,
    ) -> Result<(), DatabaseError> {
        if attribute.is_read_only() {
            return Err(DatabaseError::ReadOnlyAttribute(attribute.name()));
        }
        self.column_case = value.into_case(attribute)?;
        Ok(())
    }

    /// Drivers this build can connect with.
    pub fn available_drivers() -> &'static [&'static str] {
        AVAILABLE_DRIVERS
    }

    /// Number of forwarded data operations so far.
    pub fn query_count(&self) -> u64 {
        self.stats.count()
    }

    /// Cumulative time spent in forwarded data operations, in seconds.
    pub fn time(&self) -> f64 {
        self.stats.total_seconds()
    }

    pub fn stats(&self) -> &Arc<QueryStats> {
        &self.stats
    }

    /// Prefixed table name.
    ///
    /// With an empty `table` the bare prefix is returned. Otherwise the prefix
    /// and table are joined and, unless `trim` is set, surrounded by single
    /// spaces so the result can be spliced into SQL text directly.
    pub fn prefix(&self, table: &str, trim: bool) -> String {
        let prefix = self.settings.prefix.as_deref().unwrap_or("");
        if table.is_empty() {
            return prefix.to_string();
        }
        let space = if trim { "" } else { " " };
        format!("{space}{prefix}{table}{space}")
    }

    /// Releases resources.
    ///
    /// Closes `cursor` when given, then closes the connection when
    /// `close_connection` is set. Settings and metrics are kept, so a later
    /// `get_instance` reconnects to the same target and keeps counting.
    pub async fn free(
        &mut self,
        cursor: Option<&mut ResultSet>,
        close_connection: bool,
    ) -> Result<(), DatabaseError> {
        if let Some(cursor) = cursor {
            cursor.close_cursor();
        }
        if !close_connection {
            return Ok(());
        }
        self.in_transaction = false;
        if let Some(conn) = self.handle.take() {
            info!("Closing {} connection", self.backend_name());
            conn.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        let mut db = Database::new();
        db.get_instance(ConnectOptions::new("sqlite::memory:").prefix("ph7_"))
            .await
            .expect("in-memory sqlite connects");
        db
    }

    #[test]
    fn test_merge_keeps_previous_values_for_empty_arguments() {
        let mut settings = ConnectOptions::new("sqlite::memory:").username("root");
        settings.merge(ConnectOptions {
            dsn: Some(String::new()),
            username: None,
            password: Some("secret".to_string()),
            ..Default::default()
        });
        assert_eq!(settings.dsn.as_deref(), Some("sqlite::memory:"));
        assert_eq!(settings.username.as_deref(), Some("root"));
        assert_eq!(settings.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_prefix_forms() {
        let mut db = Database::new();
        db.configure(ConnectOptions::default().prefix("ph7_"));
        assert_eq!(db.prefix("users", false), " ph7_users ");
        assert_eq!(db.prefix("users", true), "ph7_users");
        assert_eq!(db.prefix("", false), "ph7_");
        assert_eq!(db.prefix("", true), "ph7_");
    }

    #[test]
    fn test_prefix_without_configured_prefix() {
        let db = Database::new();
        assert_eq!(db.prefix("users", false), " users ");
        assert_eq!(db.prefix("", false), "");
    }

    #[tokio::test]
    async fn test_get_instance_without_dsn_fails() {
        let mut db = Database::new();
        let err = db.get_instance(ConnectOptions::default()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::MissingDsn));
        assert!(!db.is_connected());
    }

    #[tokio::test]
    async fn test_operations_before_connect_report_not_connected() {
        let mut db = Database::new();
        assert!(matches!(
            db.exec("SELECT 1").await,
            Err(DatabaseError::NotConnected)
        ));
        assert!(matches!(
            db.query("SELECT 1").await,
            Err(DatabaseError::NotConnected)
        ));
        assert_eq!(db.query_count(), 0);
    }

    #[tokio::test]
    async fn test_exec_counts_and_reports_affected_rows() {
        let mut db = memory_db().await;
        db.exec("CREATE TABLE ph7_members (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("create table");
        let affected = db
            .exec("INSERT INTO ph7_members (name) VALUES ('ada'), ('grace')")
            .await
            .expect("insert");
        assert_eq!(affected, 2);
        assert_eq!(db.query_count(), 2);
        assert_eq!(db.last_insert_id(None).await.expect("last id"), "2");
        assert_eq!(db.error_code(), "00000");
    }

    #[tokio::test]
    async fn test_failed_statement_is_recorded() {
        let mut db = memory_db().await;
        let err = db.exec("SELECT * FROM no_such_table").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Sql(sqlx::Error::Database(_))));
        assert_ne!(db.error_code(), "00000");
        let message = db.error_info().message.clone().unwrap_or_default();
        assert!(message.contains("no_such_table"), "message: {message}");
        assert_eq!(db.query_count(), 1);
    }

    #[tokio::test]
    async fn test_column_case_attribute_applies_to_rows() {
        let mut db = memory_db().await;
        db.set_attribute(Attribute::ColumnCase, AttributeValue::Case(ColumnCase::Upper))
            .expect("column case is writable");
        let row = db
            .query_fetch_row_assoc("SELECT 1 AS answer")
            .await
            .expect("query")
            .expect("one row");
        assert_eq!(row.get("ANSWER"), Some(&Value::Integer(1)));
    }

    #[tokio::test]
    async fn test_read_only_attributes() {
        let mut db = memory_db().await;
        assert_eq!(
            db.get_attribute(Attribute::DriverName).expect("driver name"),
            AttributeValue::Text("sqlite".to_string())
        );
        let err = db
            .set_attribute(Attribute::DriverName, AttributeValue::Text("mysql".into()))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ReadOnlyAttribute("DriverName")));
    }

    #[tokio::test]
    async fn test_transaction_misuse_is_rejected() {
        let mut db = memory_db().await;
        assert!(matches!(
            db.commit().await,
            Err(DatabaseError::Transaction(_))
        ));
        db.begin_transaction().await.expect("begin");
        assert!(matches!(
            db.begin_transaction().await,
            Err(DatabaseError::Transaction(_))
        ));
        db.roll_back().await.expect("rollback");
        assert!(!db.in_transaction());
        // transaction control is not a data operation
        assert_eq!(db.query_count(), 0);
    }

    #[tokio::test]
    async fn test_prepare_reports_shape_without_counting() {
        let mut db = memory_db().await;
        let stmt = db
            .prepare("SELECT ? AS a, ? AS b")
            .await
            .expect("prepare");
        assert_eq!(stmt.columns(), ["a", "b"]);
        assert_eq!(stmt.parameter_count(), Some(2));
        assert_eq!(db.query_count(), 0);
    }
}
