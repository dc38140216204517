//! Database facade.
//!
//! This module provides:
//! - [`Database`]: one connection per configured target, forwarding statements,
//!   transactions and diagnostics to the native MySQL, PostgreSQL or SQLite
//!   driver
//! - Query metrics ([`QueryStats`]) covering every data operation
//! - DSN parsing for URL and `driver:key=value` spellings
//! - Table maintenance (optimize / repair) and backups
//!
//! # Example
//!
//! ```no_run
//! use sitekit::db::{ConnectOptions, Database};
//!
//! # async fn example() -> Result<(), sitekit::DatabaseError> {
//! let mut db = Database::new();
//! db.get_instance(ConnectOptions::new("mysql:host=localhost;dbname=app").username("app").prefix("ph7_"))
//!     .await?;
//! let members = db
//!     .query_fetch_all_assoc(&format!("SELECT * FROM{}LIMIT 10", db.prefix("members", false)))
//!     .await?;
//! println!("{} rows, {} queries in {:.3}s", members.len(), db.query_count(), db.time());
//! # Ok(())
//! # }
//! ```

mod attributes;
mod backup;
mod dsn;
mod facade;
mod handle;
mod maintenance;
mod quote;
mod result_set;
mod statement;
mod stats;
mod value;

pub use attributes::{Attribute, AttributeValue, ColumnCase};
pub use backup::{write_dump, BackupEngine, BackupFormat, BackupKind, BackupTarget, MySqlDump};
pub use dsn::{Backend, Dsn};
pub use facade::{ConnectOptions, Database};
pub use handle::Handle;
pub use maintenance::{show_tables_sql, MaintenanceOp};
pub use quote::{quote, quote_identifier, ParamType};
pub use result_set::ResultSet;
pub use statement::PreparedStatement;
pub use stats::QueryStats;
pub use value::{Row, Value};
