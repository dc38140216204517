//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// A logger was already installed for this process.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database operations.
///
/// Errors raised by the SQL client are wrapped in [`DatabaseError::Sql`] without
/// translation, so callers can still match on the underlying `sqlx::Error`.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQL connection or statement error, passed through from the client.
    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    /// The data source name could not be understood.
    #[error("Invalid DSN: {0}")]
    InvalidDsn(String),

    /// No data source name was ever supplied, so there is nothing to connect to.
    #[error("No DSN configured; pass one to get_instance() first")]
    MissingDsn,

    /// A statement was forwarded while no connection was open.
    #[error("Database connection is not open")]
    NotConnected,

    /// Transaction misuse (nested begin, commit without begin, ...).
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Backup requested for an engine that is not supported.
    #[error("The backup kind \"{0}\" is invalid")]
    InvalidBackupKind(String),

    /// Backup requested in an output format the engine cannot produce.
    #[error("The backup format \"{0}\" is invalid")]
    InvalidBackupFormat(String),

    /// The backup tool ran but did not succeed.
    #[error("Backup failed: {0}")]
    Backup(String),

    /// Attempt to change an attribute that is derived from the connection.
    #[error("Attribute {0} is read-only")]
    ReadOnlyAttribute(&'static str),

    /// Attribute value of the wrong kind for the attribute.
    #[error("Invalid value for attribute {0}")]
    InvalidAttributeValue(&'static str),

    /// Filesystem error while writing a backup.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
