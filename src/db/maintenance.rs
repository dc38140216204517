//! Table maintenance: enumerate tables, then optimize or repair each one.

use log::info;

use super::dsn::Backend;
use super::facade::Database;
use super::quote::quote_identifier;
use super::value::Value;
use crate::error_handling::DatabaseError;

/// Per-table maintenance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceOp {
    /// Reclaim space and refresh statistics
    Optimize,
    /// Rebuild damaged tables / indexes
    Repair,
}

impl MaintenanceOp {
    /// Statement performing this operation on `table`.
    pub fn statement(&self, backend: Backend, table: &str) -> String {
        let table = quote_identifier(table, backend);
        match (backend, self) {
            (Backend::MySql, MaintenanceOp::Optimize) => format!("OPTIMIZE TABLE {table}"),
            (Backend::MySql, MaintenanceOp::Repair) => format!("REPAIR TABLE {table}"),
            (Backend::Postgres, MaintenanceOp::Optimize) => format!("VACUUM ANALYZE {table}"),
            (Backend::Postgres, MaintenanceOp::Repair) => format!("REINDEX TABLE {table}"),
            (Backend::Sqlite, MaintenanceOp::Optimize) => format!("ANALYZE {table}"),
            (Backend::Sqlite, MaintenanceOp::Repair) => format!("REINDEX {table}"),
        }
    }
}

/// Query listing the user tables of the current database.
pub fn show_tables_sql(backend: Backend) -> &'static str {
    match backend {
        Backend::MySql => "SHOW TABLES",
        Backend::Postgres => {
            "SELECT tablename FROM pg_catalog.pg_tables WHERE schemaname = current_schema() ORDER BY tablename"
        }
        Backend::Sqlite => {
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        }
    }
}

impl Database {
    /// Names of all tables in the connected database.
    pub async fn show_tables(&mut self) -> Result<Vec<String>, DatabaseError> {
        let backend = self.backend().ok_or(DatabaseError::NotConnected)?;
        let tables = self
            .query(show_tables_sql(backend))
            .await?
            .filter_map(|row| match row.get_index(0) {
                Some(Value::Text(name)) => Some(name.clone()),
                Some(Value::Blob(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect();
        Ok(tables)
    }

    /// Optimizes every table, one statement per table. Returns the table names.
    pub async fn optimize(&mut self) -> Result<Vec<String>, DatabaseError> {
        self.maintain(MaintenanceOp::Optimize).await
    }

    /// Repairs every table, one statement per table. Returns the table names.
    pub async fn repair(&mut self) -> Result<Vec<String>, DatabaseError> {
        self.maintain(MaintenanceOp::Repair).await
    }

    async fn maintain(&mut self, op: MaintenanceOp) -> Result<Vec<String>, DatabaseError> {
        let backend = self.backend().ok_or(DatabaseError::NotConnected)?;
        let tables = self.show_tables().await?;
        for table in &tables {
            // MySQL answers OPTIMIZE/REPAIR with a status result set
            self.query(&op.statement(backend, table)).await?;
        }
        info!("{:?} finished for {} table(s)", op, tables.len());
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_statements() {
        assert_eq!(
            MaintenanceOp::Optimize.statement(Backend::MySql, "ph7_members"),
            "OPTIMIZE TABLE `ph7_members`"
        );
        assert_eq!(
            MaintenanceOp::Repair.statement(Backend::MySql, "ph7_members"),
            "REPAIR TABLE `ph7_members`"
        );
    }

    #[test]
    fn test_other_backend_statements() {
        assert_eq!(
            MaintenanceOp::Optimize.statement(Backend::Postgres, "users"),
            "VACUUM ANALYZE \"users\""
        );
        assert_eq!(
            MaintenanceOp::Repair.statement(Backend::Sqlite, "users"),
            "REINDEX \"users\""
        );
    }

    #[test]
    fn test_show_tables_sql() {
        assert_eq!(show_tables_sql(Backend::MySql), "SHOW TABLES");
        assert!(show_tables_sql(Backend::Sqlite).contains("sqlite_master"));
    }
}
