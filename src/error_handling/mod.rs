//! Error handling.
//!
//! This module provides:
//! - Error type definitions for initialization and database operations
//! - SQLSTATE-style diagnostics recorded for the last database call

mod info;
mod types;

// Re-export public API
pub use info::{ErrorInfo, SQLSTATE_GENERAL_ERROR, SQLSTATE_OK};
pub use types::{DatabaseError, InitializationError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_backup_kind_message_names_kind() {
        let err = DatabaseError::InvalidBackupKind("Oracle".to_string());
        assert_eq!(err.to_string(), "The backup kind \"Oracle\" is invalid");
    }

    #[test]
    fn test_sql_error_wraps_source() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::Sql(sqlx::Error::RowNotFound)));
        assert!(err.to_string().starts_with("SQL error:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = DatabaseError::from(io);
        assert!(matches!(err, DatabaseError::Io(_)));
    }
}
