//! sitekit library: database facade and client address resolution
//!
//! Two independent utilities for web applications:
//!
//! - [`db::Database`]: one caller-owned handle around a native sqlx connection
//!   that forwards connection, statement, transaction and diagnostics calls,
//!   counts every forwarded data operation with its cumulative wall-clock
//!   time, and adds table maintenance and backups.
//! - [`ip`]: picks the originating client address of a request and builds a
//!   lookup URL for it.
//!
//! # Example
//!
//! ```no_run
//! use sitekit::{ConnectOptions, Database, DatabaseError};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), DatabaseError> {
//! let mut db = Database::new();
//! db.get_instance(ConnectOptions::new("mysql:host=localhost;dbname=app").username("app"))
//!     .await?;
//! let users = db.query_fetch_all_assoc("SELECT id, name FROM users").await?;
//! println!(
//!     "{} users in {} queries ({:.3}s)",
//!     users.len(),
//!     db.query_count(),
//!     db.time()
//! );
//! db.free(None, true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The database API is async and requires a Tokio runtime. Address resolution
//! is synchronous.

pub mod config;
pub mod db;
mod error_handling;
pub mod initialization;
pub mod ip;

// Re-export public API
pub use config::{DatabaseConfig, LogFormat, LogLevel};
pub use db::{ConnectOptions, Database, QueryStats};
pub use error_handling::{
    DatabaseError, ErrorInfo, InitializationError, SQLSTATE_GENERAL_ERROR, SQLSTATE_OK,
};
pub use ip::{lookup_url, resolve, AddressResolver, RequestContext};
