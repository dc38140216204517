//! Configuration constants.
//!
//! This module defines the constants used throughout the crate: environment
//! variable names, fallback values and fixed URLs.

/// Base URL of the external IP lookup service; the address is appended verbatim.
pub const LOOKUP_BASE_URL: &str = "http://whatismyipaddress.com/ip/";

/// Address returned when no candidate passes validation.
pub const LOOPBACK_ADDRESS: &str = "127.0.0.1";

/// Minimum length of an address candidate (shortest dotted IPv4 form, `1.1.1.1`).
pub const MIN_ADDRESS_LEN: usize = 7;

// Request headers consulted for the client address, highest priority first
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";
pub const HEADER_CLIENT_IP: &str = "client-ip";
pub const HEADER_X_CLIENT_IP: &str = "x-client-ip";

// CGI-style environment variables consulted when there is no request context
pub const ENV_FORWARDED_FOR: &str = "HTTP_X_FORWARDED_FOR";
pub const ENV_CLIENT_IP: &str = "HTTP_CLIENT_IP";
pub const ENV_REMOTE_ADDR: &str = "REMOTE_ADDR";

// Database configuration environment variables
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_USER: &str = "DATABASE_USER";
pub const ENV_DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
pub const ENV_DATABASE_PREFIX: &str = "DATABASE_PREFIX";
pub const ENV_MYSQLDUMP_BIN: &str = "MYSQLDUMP_BIN";

/// Default `mysqldump` executable, resolved through `PATH`.
pub const DEFAULT_MYSQLDUMP_BIN: &str = "mysqldump";

/// Default backup output format.
pub const DEFAULT_BACKUP_FORMAT: &str = "sql";

/// Driver names accepted in DSNs, as reported by `Database::available_drivers`.
pub const AVAILABLE_DRIVERS: &[&str] = &["mysql", "pgsql", "sqlite"];
