//! SQLSTATE-style diagnostics for the last forwarded call.

use serde::Serialize;

/// SQLSTATE reported after a successful call.
pub const SQLSTATE_OK: &str = "00000";

/// Generic SQLSTATE used when the failure did not come from the database server.
pub const SQLSTATE_GENERAL_ERROR: &str = "HY000";

/// Extended error information about the most recent operation on a handle.
///
/// Mirrors the usual three-part shape: SQLSTATE, driver-specific code, message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Five-character SQLSTATE, `"00000"` when the last call succeeded
    pub sqlstate: String,
    /// Driver-specific error code, if the driver reported one
    pub driver_code: Option<String>,
    /// Driver-specific error message
    pub message: Option<String>,
}

impl Default for ErrorInfo {
    fn default() -> Self {
        Self::ok()
    }
}

impl ErrorInfo {
    /// Diagnostics for a call that succeeded.
    pub fn ok() -> Self {
        Self {
            sqlstate: SQLSTATE_OK.to_string(),
            driver_code: None,
            message: None,
        }
    }

    /// Builds diagnostics from a client error.
    ///
    /// Database errors keep their server code; SQLSTATE-shaped codes (five
    /// alphanumeric characters, as MySQL and Postgres report) double as the
    /// SQLSTATE, anything else maps to `HY000`.
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                let sqlstate = code
                    .as_deref()
                    .filter(|c| c.len() == 5 && c.chars().all(|ch| ch.is_ascii_alphanumeric()))
                    .unwrap_or(SQLSTATE_GENERAL_ERROR)
                    .to_string();
                Self {
                    sqlstate,
                    driver_code: code,
                    message: Some(db_err.message().to_string()),
                }
            }
            other => Self {
                sqlstate: SQLSTATE_GENERAL_ERROR.to_string(),
                driver_code: None,
                message: Some(other.to_string()),
            },
        }
    }

    /// Whether this describes a successful call.
    pub fn is_ok(&self) -> bool {
        self.sqlstate == SQLSTATE_OK
    }
}
